// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Turns a [`Policy`] into an accessible-row-ids query.
//!
//! Joins are built as plain SQL text rather than typed diesel query
//! expressions: the algebra is generic over an application-defined, open
//! set of entities (registered at runtime by table name), which diesel's
//! compile-time table/column types cannot express. Table and column names
//! only ever come from [`EntitySpec`]/[`Relationship`] (never from request
//! input), so this is safe despite being string-built; every
//! principal-derived value is passed as a bound parameter, never
//! interpolated.

use crate::error::{AclError, Result};
use crate::policy::{AccessMode, Logic, Policy};
use crate::registry::{EntityRegistry, EntitySpec};
use baselayer_types::Principal;
use diesel::pg::Pg;
use diesel::query_builder::BoxedSqlQuery;
use diesel::sql_types::{Array, BigInt};
use diesel::{PgConnection, QueryableByName, RunQueryDsl};

#[derive(Debug, Clone)]
enum Bind {
    I64(i64),
    I64Array(Vec<i64>),
}

/// The compiled accessible-row-ids query for one `(entity, mode, principal)`
/// triple.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    id_column: &'static str,
    sql: String,
    binds: Vec<Bind>,
}

#[derive(QueryableByName)]
struct IdRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

impl CompiledFilter {
    /// Runs the compiled query and returns the set of accessible ids.
    pub fn accessible_ids(&self, conn: &mut PgConnection) -> diesel::QueryResult<Vec<i64>> {
        let mut query: BoxedSqlQuery<Pg, _> = diesel::sql_query(self.sql.clone()).into_boxed();
        for bind in &self.binds {
            query = match bind {
                Bind::I64(v) => query.bind::<BigInt, _>(*v),
                Bind::I64Array(v) => query.bind::<Array<BigInt>, _>(v.clone()),
            };
        }
        query
            .load::<IdRow>(conn)
            .map(|rows| rows.into_iter().map(|r| r.id).collect())
    }

    /// Narrows the query to a single row and tests for its presence.
    pub fn contains(&self, conn: &mut PgConnection, id: i64) -> diesel::QueryResult<bool> {
        Ok(self.accessible_ids(conn)?.contains(&id))
    }
}

struct Builder {
    id_column: &'static str,
    sql: String,
    binds: Vec<Bind>,
}

impl Builder {
    fn new(id_column: &'static str, sql: String) -> Self {
        Self {
            id_column,
            sql,
            binds: Vec::new(),
        }
    }

    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn push_bind_i64(&mut self, v: i64) {
        self.binds.push(Bind::I64(v));
        self.sql.push('$');
        self.sql.push_str(&self.binds.len().to_string());
    }

    fn push_bind_i64_array(&mut self, v: Vec<i64>) {
        self.binds.push(Bind::I64Array(v));
        self.sql.push('$');
        self.sql.push_str(&self.binds.len().to_string());
    }

    fn finish(self) -> CompiledFilter {
        CompiledFilter {
            id_column: self.id_column,
            sql: self.sql,
            binds: self.binds,
        }
    }
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

/// Shifts every `$N` placeholder in `sql` up by `offset`, so a compiled
/// subquery can be embedded into an outer query that already owns the
/// first `offset` bind slots.
fn renumber_placeholders(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c == '$' {
            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                out.push('$');
            } else {
                let n: usize = digits.parse().expect("digits");
                out.push('$');
                out.push_str(&(n + offset).to_string());
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn select_all(spec: EntitySpec) -> CompiledFilter {
    let sql = format!(
        "SELECT {}.{} AS id FROM {}",
        quote(spec.table),
        quote(spec.id_column),
        quote(spec.table)
    );
    Builder::new(spec.id_column, sql).finish()
}

fn select_none(spec: EntitySpec) -> CompiledFilter {
    let sql = format!(
        "SELECT {}.{} AS id FROM {} WHERE FALSE",
        quote(spec.table),
        quote(spec.id_column),
        quote(spec.table)
    );
    Builder::new(spec.id_column, sql).finish()
}

pub(crate) fn compile(
    policy: &Policy,
    spec: EntitySpec,
    principal: &Principal,
    registry: &EntityRegistry,
) -> Result<CompiledFilter> {
    match policy {
        Policy::Public => Ok(select_all(spec)),
        Policy::Restricted => {
            if principal.is_admin() {
                Ok(select_all(spec))
            } else {
                Ok(select_none(spec))
            }
        }
        Policy::AccessibleIfUserMatches(chain) => {
            if principal.is_admin() {
                return Ok(select_all(spec));
            }
            compile_user_matches(chain, spec, principal, registry)
        }
        Policy::AccessibleIfRelatedRowsAreAccessible(clauses) => {
            if principal.is_admin() {
                return Ok(select_all(spec));
            }
            compile_related_rows(clauses, spec, principal, registry)
        }
        Policy::Composed(policies, logic) => compile_composed(policies, *logic, spec, principal, registry),
        Policy::Custom(f) => Ok(f(&spec, principal)),
    }
}

fn compile_user_matches(
    chain: &[&'static str],
    spec: EntitySpec,
    principal: &Principal,
    registry: &EntityRegistry,
) -> Result<CompiledFilter> {
    let first = chain.first().ok_or(AclError::EmptyChain)?;
    let mut current = spec;
    let mut joins: Vec<(&'static str, &'static str, &'static str, &'static str, String)> = Vec::new();

    let _ = first;
    for (idx, name) in chain.iter().enumerate() {
        let rel = current
            .relationship(name)
            .ok_or(AclError::UnknownRelationship {
                entity: current.table,
                name: *name,
            })?;
        let related = registry.spec(rel.related_entity)?;
        let alias = format!("t{idx}");
        joins.push((current.table, rel.local_column, related.table, rel.related_column, alias));
        current = *related;
    }

    let mut sql = format!(
        "SELECT {}.{} AS id FROM {}",
        quote(spec.table),
        quote(spec.id_column),
        quote(spec.table)
    );

    let mut prev_alias = spec.table.to_string();
    for (_from_table, local_column, related_table, related_column, alias) in &joins {
        sql.push_str(&format!(
            " INNER JOIN {} AS {} ON {}.{} = {}.{}",
            quote(related_table),
            quote(alias),
            quote(&prev_alias),
            quote(local_column),
            quote(alias),
            quote(related_column),
        ));
        prev_alias = alias.clone();
    }

    let mut builder = Builder::new(spec.id_column, sql);
    builder.push(&format!(" WHERE {}.{} = ", quote(&prev_alias), quote(current.id_column)));
    builder.push_bind_i64(principal.effective_user_id().into_inner());
    Ok(builder.finish())
}

fn compile_related_rows(
    clauses: &[(&'static str, AccessMode)],
    spec: EntitySpec,
    principal: &Principal,
    registry: &EntityRegistry,
) -> Result<CompiledFilter> {
    if clauses.is_empty() {
        return Err(AclError::EmptyChain);
    }

    let mut sql = format!(
        "SELECT {}.{} AS id FROM {}",
        quote(spec.table),
        quote(spec.id_column),
        quote(spec.table)
    );
    let mut all_binds = Vec::new();

    for (idx, (name, mode)) in clauses.iter().enumerate() {
        let rel = spec.relationship(name).ok_or(AclError::UnknownRelationship {
            entity: spec.table,
            name: *name,
        })?;
        let related = registry.spec(rel.related_entity)?;
        let related_policy = registry.policy(rel.related_entity, *mode)?;

        if matches!(related_policy, Policy::Public) {
            continue;
        }

        let sub = compile(related_policy, *related, principal, registry)?;
        let alias = format!("acc{idx}");
        let sub_sql = renumber_placeholders(&sub.sql, all_binds.len());
        sql.push_str(&format!(
            " INNER JOIN ({}) AS {} ON {}.{} = {}.{}",
            sub_sql,
            quote(&alias),
            quote(spec.table),
            quote(rel.local_column),
            quote(&alias),
            quote("id"),
        ));
        all_binds.extend(sub.binds);
    }

    Ok(CompiledFilter {
        id_column: spec.id_column,
        sql,
        binds: all_binds,
    })
}

fn compile_composed(
    policies: &[Policy],
    logic: Logic,
    spec: EntitySpec,
    principal: &Principal,
    registry: &EntityRegistry,
) -> Result<CompiledFilter> {
    // Public is the AND identity: skip it from the conjunction entirely.
    let effective: Vec<&Policy> = match logic {
        Logic::And => policies.iter().filter(|p| !matches!(p, Policy::Public)).collect(),
        Logic::Or => policies.iter().collect(),
    };

    if effective.is_empty() {
        return Ok(select_all(spec));
    }

    let mut sql = format!(
        "SELECT {}.{} AS id FROM {}",
        quote(spec.table),
        quote(spec.id_column),
        quote(spec.table)
    );
    let mut all_binds = Vec::new();
    let mut aliases = Vec::new();

    for (idx, p) in effective.iter().enumerate() {
        let sub = compile(p, spec, principal, registry)?;
        let alias = format!("sub{idx}");
        let join_kind = match logic {
            Logic::And => "INNER JOIN",
            Logic::Or => "LEFT OUTER JOIN",
        };
        let sub_sql = renumber_placeholders(&sub.sql, all_binds.len());
        sql.push_str(&format!(
            " {} ({}) AS {} ON {}.{} = {}.{}",
            join_kind,
            sub_sql,
            quote(&alias),
            quote(spec.table),
            quote(spec.id_column),
            quote(&alias),
            quote("id"),
        ));
        all_binds.extend(sub.binds);
        aliases.push(alias);
    }

    if logic == Logic::Or {
        let conditions: Vec<String> = aliases
            .iter()
            .map(|a| format!("{}.{} IS NOT NULL", quote(a), quote("id")))
            .collect();
        sql.push_str(&format!(" WHERE {}", conditions.join(" OR ")));
    }

    Ok(CompiledFilter {
        id_column: spec.id_column,
        sql,
        binds: all_binds,
    })
}

