// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The `acls` table: string-keyed capabilities seeded at schema bootstrap.

use crate::schema::acls;
use baselayer_db::{DbConnection, OptionalExt, Result};
use baselayer_types::core::AclId;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = acls)]
pub struct Acl {
    pub id: AclId,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Acl {
    #[tracing::instrument(err, skip_all)]
    pub fn get_by_key(conn: &mut DbConnection, key: &str) -> Result<Option<Acl>> {
        acls::table
            .filter(acls::key.eq(key))
            .get_result(conn)
            .optional()
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all(conn: &mut DbConnection) -> Result<Vec<Acl>> {
        Ok(acls::table.load(conn)?)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = acls)]
pub struct NewAcl {
    pub key: String,
}

impl NewAcl {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Acl> {
        Ok(self.insert_into(acls::table).get_result(conn)?)
    }
}
