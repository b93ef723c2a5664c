// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Bearer tokens: long-lived credentials that act on behalf of the user
//! that created them, carrying a delegated subset of that user's
//! permissions.

use crate::acls::Acl;
use crate::schema::{acls, token_acls, tokens};
use baselayer_db::{DbConnection, OptionalExt, Result};
use baselayer_types::core::{AclId, TokenId, UserId};
use baselayer_types::{Principal, TokenPrincipal};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = tokens)]
pub struct Token {
    pub id: TokenId,
    pub name: String,
    pub created_by_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, id: &TokenId) -> Result<Option<Token>> {
        tokens::table.find(id).get_result(conn).optional()
    }

    /// A creator may not hold two tokens with the same name:
    /// `(created_by_id, name)` is unique.
    #[tracing::instrument(err, skip_all)]
    pub fn get_by_creator_and_name(
        conn: &mut DbConnection,
        created_by_id: UserId,
        name: &str,
    ) -> Result<Option<Token>> {
        tokens::table
            .filter(tokens::created_by_id.eq(created_by_id))
            .filter(tokens::name.eq(name))
            .get_result(conn)
            .optional()
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_for_user(conn: &mut DbConnection, created_by_id: UserId) -> Result<Vec<Token>> {
        Ok(tokens::table
            .filter(tokens::created_by_id.eq(created_by_id))
            .order_by(tokens::created_at.desc())
            .load(conn)?)
    }

    /// The ACLs delegated to this token at issuance time.
    #[tracing::instrument(err, skip_all)]
    pub fn permissions(&self, conn: &mut DbConnection) -> Result<BTreeSet<String>> {
        Ok(token_acls::table
            .inner_join(acls::table)
            .filter(token_acls::token_id.eq(&self.id))
            .select(acls::key)
            .load(conn)?
            .into_iter()
            .collect())
    }

    #[tracing::instrument(err, skip_all)]
    pub fn to_principal(&self, conn: &mut DbConnection) -> Result<Principal> {
        Ok(Principal::Token(TokenPrincipal {
            id: self.id.clone(),
            created_by: self.created_by_id.clone(),
            permissions: self.permissions(conn)?,
        }))
    }

    #[tracing::instrument(err, skip_all)]
    pub fn revoke(conn: &mut DbConnection, id: &TokenId) -> Result<()> {
        diesel::delete(tokens::table.find(id)).execute(conn)?;
        Ok(())
    }
}

/// A token under construction. The issuing handler is responsible for
/// checking that `acls` is a subset of the creator's own permissions;
/// this is not enforced by the database.
#[derive(Debug)]
pub struct NewToken {
    pub name: String,
    pub created_by_id: UserId,
    pub acls: Vec<AclId>,
}

impl NewToken {
    pub fn new(name: impl Into<String>, created_by_id: UserId, acls: Vec<AclId>) -> Self {
        Self {
            name: name.into(),
            created_by_id,
            acls,
        }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<Token> {
        conn.transaction(|conn| {
            let id = TokenId::generate();

            let token: Token = diesel::insert_into(tokens::table)
                .values((
                    tokens::id.eq(&id),
                    tokens::name.eq(&self.name),
                    tokens::created_by_id.eq(self.created_by_id),
                ))
                .get_result(conn)?;

            let grants: Vec<_> = self
                .acls
                .iter()
                .map(|acl_id| (token_acls::token_id.eq(&id), token_acls::acl_id.eq(acl_id)))
                .collect();

            if !grants.is_empty() {
                diesel::insert_into(token_acls::table)
                    .values(grants)
                    .execute(conn)?;
            }

            Ok(token)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_carries_requested_acls() {
        let new = NewToken::new("ci", UserId::from(1), vec![AclId::from(3), AclId::from(4)]);
        assert_eq!(new.acls.len(), 2);
        assert_eq!(new.name, "ci");
    }
}
