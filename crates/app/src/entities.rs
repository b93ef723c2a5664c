// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The access-control entities this demo registers.
//!
//! Bearer tokens are deliberately left out of this registry: the algebra
//! compiles every policy down to an `id_column = $1`-shaped filter over an
//! `i64` primary key, and `tokens.id` is the opaque `Text` credential
//! itself. Token access is instead authorized directly by ownership
//! (`created_by_id == principal.effective_user_id()`), checked in
//! `handlers.rs` without going through [`baselayer_session::VerifiedSession`].

use baselayer_acl::{EntityRegistry, EntitySpec, Policy};

pub const USERS: EntitySpec = EntitySpec {
    table: "users",
    id_column: "id",
    relationships: &[],
};

pub const ROLES: EntitySpec = EntitySpec {
    table: "roles",
    id_column: "id",
    relationships: &[],
};

/// Builds the registry this demo runs against. An application with its own
/// domain entities would register those here alongside these core ones.
pub fn registry() -> EntityRegistry {
    EntityRegistry::builder()
        .register(USERS, Policy::Restricted, Policy::Restricted, Policy::Restricted, Policy::Restricted)
        .expect("USERS has no relationships to validate")
        .register(ROLES, Policy::Restricted, Policy::Restricted, Policy::Restricted, Policy::Restricted)
        .expect("ROLES has no relationships to validate")
        .build()
}
