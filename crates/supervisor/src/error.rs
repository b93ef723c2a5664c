// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("service `{name}` is listed in both services.enabled and services.disabled")]
    ConflictingServiceEntry { name: String },
    #[error("duplicate service fragment for `{name}`")]
    DuplicateService { name: String },
    #[error("migration error: {0}")]
    Migration(#[from] anyhow::Error),
}

pub type Result<T, E = SupervisorError> = std::result::Result<T, E>;
