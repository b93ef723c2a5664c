// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

crate::diesel_newtype! {
    /// Surrogate primary key of a [`User`](crate::core::UserId)
    #[derive(Copy)]
    UserId(i64) => diesel::sql_types::BigInt
}
