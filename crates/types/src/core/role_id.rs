// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

crate::diesel_newtype! {
    /// Surrogate primary key of a [`Role`](crate::core::RoleId)
    #[derive(Copy)]
    RoleId(i64) => diesel::sql_types::BigInt
}
