// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

crate::diesel_newtype! {
    /// Opaque bearer credential identifying a [`Token`](crate::core::TokenId)
    ///
    /// Generated as 128 bits of randomness, hex-encoded. Used directly as the
    /// `Authorization: token <id>` credential, so it carries no structure
    /// beyond uniqueness.
    TokenId(String) => diesel::sql_types::Text
}

#[cfg(feature = "rand")]
impl TokenId {
    /// Generate a new random token id.
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);

        Self::from(hex::encode(bytes))
    }
}
