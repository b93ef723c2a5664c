// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors raised while compiling or evaluating an access policy.
///
/// Most variants are raised at policy *construction* time, surfacing
/// programming errors early rather than at query time.
#[derive(Debug, Error)]
pub enum AclError {
    #[error("policy references an empty relationship chain")]
    EmptyChain,
    #[error("entity `{entity}` has no relationship named `{name}`")]
    UnknownRelationship { entity: &'static str, name: &'static str },
    #[error("entity `{0}` is not registered")]
    UnknownEntity(&'static str),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("the connection pool returned an error: {0}")]
    Pool(#[from] baselayer_db::DatabaseError),
}

pub type Result<T, E = AclError> = std::result::Result<T, E>;
