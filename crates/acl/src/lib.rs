// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The row-level access-control algebra: declarative policies compiled
//! into the database queries that select exactly the rows of an entity
//! a principal may access.
//!
//! An application registers its entities and their policies once, at
//! startup, into an [`EntityRegistry`]. The two entry points a handler
//! (or, more commonly, [`baselayer_session`]) calls are [`Acl::is_accessible_by`]
//! for a single row and [`Acl::get_all`] for the listing query.

#[macro_use]
extern crate diesel;

mod compiler;
mod error;
mod policy;
mod registry;
#[cfg(test)]
mod tests;

pub use compiler::CompiledFilter;
pub use error::{AclError, Result};
pub use policy::{AccessMode, Logic, Policy};
pub use registry::{EntityRegistry, EntityRegistryBuilder, EntitySpec, Relationship};

use baselayer_types::Principal;
use diesel::PgConnection;
use std::sync::Arc;

/// Facade over a shared [`EntityRegistry`], used by request handlers and
/// by [`baselayer_session`] to evaluate policies against a live
/// connection.
#[derive(Clone)]
pub struct Acl {
    registry: Arc<EntityRegistry>,
}

impl Acl {
    pub fn new(registry: Arc<EntityRegistry>) -> Self {
        Self { registry }
    }

    /// Compiles `entity`'s policy for `mode` against `principal`.
    pub fn compile(
        &self,
        entity: &'static str,
        mode: AccessMode,
        principal: &Principal,
    ) -> Result<CompiledFilter> {
        let spec = *self.registry.spec(entity)?;
        let policy = self.registry.policy(entity, mode)?;
        policy.compile(spec, principal, &self.registry)
    }

    /// Point query: is a single row accessible?
    pub fn is_accessible_by(
        &self,
        conn: &mut PgConnection,
        entity: &'static str,
        mode: AccessMode,
        principal: &Principal,
        id: i64,
    ) -> Result<bool> {
        let filter = self.compile(entity, mode, principal)?;
        Ok(filter.contains(conn, id)?)
    }

    /// Bulk query: every id of `entity` accessible to `principal` under
    /// `mode`.
    pub fn get_all(
        &self,
        conn: &mut PgConnection,
        entity: &'static str,
        mode: AccessMode,
        principal: &Principal,
    ) -> Result<Vec<i64>> {
        let filter = self.compile(entity, mode, principal)?;
        Ok(filter.accessible_ids(conn)?)
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }
}
