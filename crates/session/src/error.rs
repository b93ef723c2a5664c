// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Raised when [`VerifiedSession::commit`](crate::VerifiedSession::commit)
/// finds a row the principal has no access to and the session is running
/// under [`LeakPolicy::Strict`](crate::LeakPolicy::Strict). The caller's
/// handler maps this to HTTP 401.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("principal has no `{mode:?}` access to {entity} #{id}")]
    Denied {
        entity: &'static str,
        mode: baselayer_acl::AccessMode,
        id: i64,
    },
    #[error("access control error: {0}")]
    Acl(#[from] baselayer_acl::AclError),
    #[error("database error: {0}")]
    Database(#[from] baselayer_db::DatabaseError),
    #[error("database error: {0}")]
    Diesel(#[from] diesel::result::Error),
}

pub type Result<T, E = AccessError> = std::result::Result<T, E>;
