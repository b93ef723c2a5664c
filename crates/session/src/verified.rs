// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! [`VerifiedSession`]: the request-scoped unit of work that tracks every
//! row a handler touches and verifies access to all of them atomically at
//! commit time.

use crate::error::{AccessError, Result};
use baselayer_acl::{AccessMode, Acl};
use baselayer_db::DbConnection;
use baselayer_types::Principal;
use diesel::Connection;
use std::collections::{HashMap, HashSet};

/// Controls what happens when `commit()` finds a row the principal cannot
/// access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeakPolicy {
    /// Raise [`AccessError`] and roll back.
    Strict,
    /// Log a warning and continue; the transaction still rolls back because
    /// `commit()` returns the error to the caller regardless.
    Warn,
}

type PendingRun<'c> = Box<dyn FnOnce(&mut DbConnection) -> Result<i64> + 'c>;

struct PendingOp<'c> {
    entity: &'static str,
    run: PendingRun<'c>,
}

/// A scoped unit of work over one pooled connection: a change log of rows
/// read, updated, deleted and created, verified against the access-control
/// algebra when [`commit`](Self::commit) is called.
///
/// Entities participate by tracking themselves with [`track_read`],
/// [`stage_update`], [`stage_delete`] and [`stage_create`] as the handler
/// loads and mutates them; the session issues no SQL itself until commit,
/// at which point staged operations run inside a single transaction.
///
/// [`track_read`]: Self::track_read
/// [`stage_update`]: Self::stage_update
/// [`stage_delete`]: Self::stage_delete
/// [`stage_create`]: Self::stage_create
pub struct VerifiedSession<'c> {
    conn: &'c mut DbConnection,
    principal: Principal,
    acl: Acl,
    leak_policy: LeakPolicy,
    reads: HashMap<&'static str, HashSet<i64>>,
    update_ids: HashMap<&'static str, HashSet<i64>>,
    delete_ids: HashMap<&'static str, HashSet<i64>>,
    pending_updates: Vec<PendingOp<'c>>,
    pending_deletes: Vec<PendingOp<'c>>,
    pending_creates: Vec<PendingOp<'c>>,
}

impl<'c> VerifiedSession<'c> {
    pub fn new(conn: &'c mut DbConnection, principal: Principal, acl: Acl, leak_policy: LeakPolicy) -> Self {
        Self {
            conn,
            principal,
            acl,
            leak_policy,
            reads: HashMap::new(),
            update_ids: HashMap::new(),
            delete_ids: HashMap::new(),
            pending_updates: Vec::new(),
            pending_deletes: Vec::new(),
            pending_creates: Vec::new(),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Records that `id` of `entity` was loaded and is, for now, untouched.
    /// Verified under [`AccessMode::Read`] at commit time.
    pub fn track_read(&mut self, entity: &'static str, id: i64) {
        self.reads.entry(entity).or_default().insert(id);
    }

    /// Stages an in-place modification of an already-loaded row. `run`
    /// issues the actual `UPDATE` when the session flushes; its return
    /// value is the row's (unchanged) id. Verified under
    /// [`AccessMode::Update`], before flush.
    pub fn stage_update(
        &mut self,
        entity: &'static str,
        id: i64,
        run: impl FnOnce(&mut DbConnection) -> Result<()> + 'c,
    ) {
        self.reads.entry(entity).and_modify(|ids| {
            ids.remove(&id);
        });
        self.update_ids.entry(entity).or_default().insert(id);
        self.pending_updates.push(PendingOp {
            entity,
            run: Box::new(move |conn| {
                run(conn)?;
                Ok(id)
            }),
        });
    }

    /// Stages deletion of an already-loaded row. Verified under
    /// [`AccessMode::Delete`] *before* flush, since once a row is deleted
    /// the relationships it participated in are no longer joinable.
    pub fn stage_delete(
        &mut self,
        entity: &'static str,
        id: i64,
        run: impl FnOnce(&mut DbConnection) -> Result<()> + 'c,
    ) {
        self.reads.entry(entity).and_modify(|ids| {
            ids.remove(&id);
        });
        self.delete_ids.entry(entity).or_default().insert(id);
        self.pending_deletes.push(PendingOp {
            entity,
            run: Box::new(move |conn| {
                run(conn)?;
                Ok(id)
            }),
        });
    }

    /// Stages insertion of a new row. `run` performs the `INSERT` and
    /// returns the assigned primary key. Verified under
    /// [`AccessMode::Create`] *after* flush, since the policy expression
    /// may reference the row's own (only just assigned) id.
    pub fn stage_create(&mut self, entity: &'static str, run: impl FnOnce(&mut DbConnection) -> Result<i64> + 'c) {
        self.pending_creates.push(PendingOp {
            entity,
            run: Box::new(run),
        });
    }

    /// Verifies every tracked and staged row against the access-control
    /// algebra, flushes staged mutations, verifies newly created rows, and
    /// commits — all inside one transaction. On any access violation (under
    /// [`LeakPolicy::Strict`]) or database error, the transaction is rolled
    /// back and the error is returned.
    #[tracing::instrument(skip_all)]
    pub fn commit(self) -> Result<()> {
        let VerifiedSession {
            conn,
            principal,
            acl,
            leak_policy,
            reads,
            update_ids,
            delete_ids,
            pending_updates,
            pending_deletes,
            pending_creates,
        } = self;

        conn.transaction(|conn| {
            bulk_verify(conn, &acl, &principal, AccessMode::Read, &reads, leak_policy)?;
            bulk_verify(conn, &acl, &principal, AccessMode::Update, &update_ids, leak_policy)?;
            bulk_verify(conn, &acl, &principal, AccessMode::Delete, &delete_ids, leak_policy)?;

            // Deletes flush first: once gone, a row's relationships can no
            // longer be joined, so nothing downstream may depend on them.
            for op in pending_deletes {
                (op.run)(conn)?;
            }
            for op in pending_updates {
                (op.run)(conn)?;
            }

            let mut created_ids: HashMap<&'static str, HashSet<i64>> = HashMap::new();
            for op in pending_creates {
                let entity = op.entity;
                let id = (op.run)(conn)?;
                created_ids.entry(entity).or_default().insert(id);
            }

            bulk_verify(conn, &acl, &principal, AccessMode::Create, &created_ids, leak_policy)?;

            Ok(())
        })
    }
}

fn bulk_verify(
    conn: &mut DbConnection,
    acl: &Acl,
    principal: &Principal,
    mode: AccessMode,
    grouped: &HashMap<&'static str, HashSet<i64>>,
    leak_policy: LeakPolicy,
) -> Result<()> {
    for (entity, ids) in grouped {
        if ids.is_empty() {
            continue;
        }

        let accessible: HashSet<i64> = acl.get_all(conn, entity, mode, principal)?.into_iter().collect();

        for id in ids {
            if !accessible.contains(id) {
                report_leak(*entity, mode, *id, leak_policy)?;
            }
        }
    }
    Ok(())
}

fn report_leak(entity: &'static str, mode: AccessMode, id: i64, leak_policy: LeakPolicy) -> Result<()> {
    match leak_policy {
        LeakPolicy::Strict => Err(AccessError::Denied { entity, mode, id }),
        LeakPolicy::Warn => {
            log::warn!("access leak: principal lacks {mode:?} access to {entity} #{id}");
            Ok(())
        }
    }
}
