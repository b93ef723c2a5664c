// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Static metadata describing the entities an application registers with
//! the access-control algebra: their table, their relationships to other
//! entities, and the policy they declare per access mode.

use crate::error::{AclError, Result};
use crate::policy::{AccessMode, Policy};
use std::collections::HashMap;

/// A named relationship from one entity to another, e.g. `document.owner`
/// pointing at `users` via the `owner_id` foreign key.
#[derive(Debug, Clone, Copy)]
pub struct Relationship {
    /// Name used in [`Policy::AccessibleIfUserMatches`] chains and
    /// [`Policy::AccessibleIfRelatedRowsAreAccessible`] clauses.
    pub name: &'static str,
    /// Foreign-key column on the *owning* side's table.
    pub local_column: &'static str,
    /// Name of the entity this relationship points at, as registered in
    /// the [`EntityRegistry`].
    pub related_entity: &'static str,
    /// Primary-key column on the related table, almost always `"id"`.
    pub related_column: &'static str,
}

/// Static description of one entity participating in the access-control
/// algebra.
#[derive(Debug, Clone, Copy)]
pub struct EntitySpec {
    /// Registry key, also used as the SQL table name.
    pub table: &'static str,
    /// Primary-key column, almost always `"id"`.
    pub id_column: &'static str,
    pub relationships: &'static [Relationship],
}

impl EntitySpec {
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// The set of entities the access-control algebra knows about, keyed by
/// table name, together with the policy each declares per [`AccessMode`].
///
/// Built once at application startup and shared behind an `Arc`.
pub struct EntityRegistry {
    entities: HashMap<&'static str, EntitySpec>,
    policies: HashMap<(&'static str, AccessMode), Policy>,
}

impl EntityRegistry {
    pub fn builder() -> EntityRegistryBuilder {
        EntityRegistryBuilder::default()
    }

    pub fn spec(&self, entity: &'static str) -> Result<&EntitySpec> {
        self.entities.get(entity).ok_or(AclError::UnknownEntity(entity))
    }

    pub fn policy(&self, entity: &'static str, mode: AccessMode) -> Result<&Policy> {
        self.policies
            .get(&(entity, mode))
            .ok_or(AclError::UnknownEntity(entity))
    }
}

#[derive(Default)]
pub struct EntityRegistryBuilder {
    entities: HashMap<&'static str, EntitySpec>,
    policies: HashMap<(&'static str, AccessMode), Policy>,
}

impl EntityRegistryBuilder {
    /// Registers an entity and the four policies it declares. Validates
    /// every relationship chain referenced by those policies eagerly, so
    /// construction-time errors surface before the registry is ever
    /// queried.
    pub fn register(
        mut self,
        spec: EntitySpec,
        create: Policy,
        read: Policy,
        update: Policy,
        delete: Policy,
    ) -> Result<Self> {
        for (mode, policy) in [
            (AccessMode::Create, &create),
            (AccessMode::Read, &read),
            (AccessMode::Update, &update),
            (AccessMode::Delete, &delete),
        ] {
            policy.validate(spec)?;
            let _ = mode;
        }

        self.entities.insert(spec.table, spec);
        self.policies.insert((spec.table, AccessMode::Create), create);
        self.policies.insert((spec.table, AccessMode::Read), read);
        self.policies.insert((spec.table, AccessMode::Update), update);
        self.policies.insert((spec.table, AccessMode::Delete), delete);
        Ok(self)
    }

    pub fn build(self) -> EntityRegistry {
        EntityRegistry {
            entities: self.entities,
            policies: self.policies,
        }
    }
}
