// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The `roles` table and its many-to-many link to `acls`.

use crate::acls::Acl;
use crate::schema::{acls, role_acls, roles};
use baselayer_db::{DbConnection, OptionalExt, Result};
use baselayer_types::core::{AclId, RoleId};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = roles)]
pub struct Role {
    pub id: RoleId,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    #[tracing::instrument(err, skip_all)]
    pub fn get_by_key(conn: &mut DbConnection, key: &str) -> Result<Option<Role>> {
        roles::table
            .filter(roles::key.eq(key))
            .get_result(conn)
            .optional()
    }

    #[tracing::instrument(err, skip_all)]
    pub fn acls(&self, conn: &mut DbConnection) -> Result<Vec<Acl>> {
        Ok(role_acls::table
            .inner_join(acls::table)
            .filter(role_acls::role_id.eq(&self.id))
            .select(acls::all_columns)
            .load(conn)?)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn grant(conn: &mut DbConnection, role_id: RoleId, acl_id: AclId) -> Result<()> {
        diesel::insert_into(role_acls::table)
            .values((role_acls::role_id.eq(role_id), role_acls::acl_id.eq(acl_id)))
            .on_conflict_do_nothing()
            .execute(conn)?;
        Ok(())
    }

    #[tracing::instrument(err, skip_all)]
    pub fn delete(conn: &mut DbConnection, id: RoleId) -> Result<()> {
        diesel::delete(roles::table.find(id)).execute(conn)?;
        Ok(())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = roles)]
pub struct NewRole {
    pub key: String,
}

impl NewRole {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Role> {
        Ok(self.insert_into(roles::table).get_result(conn)?)
    }
}
