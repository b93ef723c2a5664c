// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

crate::diesel_newtype! {
    /// Surrogate primary key of an [`Acl`](crate::core::AclId)
    #[derive(Copy)]
    AclId(i64) => diesel::sql_types::BigInt
}
