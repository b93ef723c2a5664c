// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The `users` table and the permission/role machinery layered on top of it.

use crate::acls::Acl;
use crate::schema::{acls, role_acls, roles, user_acls, user_roles, users};
use crate::{levenshtein, lower, soundex};
use baselayer_db::{DbConnection, OptionalExt, Paginate, Result};
use baselayer_types::core::UserId;
use baselayer_types::{Principal, UserPrincipal};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as Json;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub oauth_uid: Option<String>,
    pub preferences: Json,
    pub expiration_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A user is active iff its expiration date is unset or in the future.
    pub fn is_active(&self) -> bool {
        match self.expiration_date {
            Some(expiration) => expiration > Utc::now(),
            None => true,
        }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get(conn: &mut DbConnection, id: UserId) -> Result<User> {
        Ok(users::table.find(id).get_result(conn)?)
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_by_username(conn: &mut DbConnection, username: &str) -> Result<Option<User>> {
        users::table
            .filter(users::username.eq(username))
            .get_result(conn)
            .optional()
    }

    #[tracing::instrument(err, skip_all)]
    pub fn get_all_by_ids(conn: &mut DbConnection, ids: &[UserId]) -> Result<Vec<User>> {
        Ok(users::table.filter(users::id.eq_any(ids)).load(conn)?)
    }

    #[tracing::instrument(err, skip_all, fields(%limit, %page))]
    pub fn get_all_paginated(
        conn: &mut DbConnection,
        limit: i64,
        page: i64,
    ) -> Result<(Vec<User>, i64)> {
        Ok(users::table
            .order_by(users::id.desc())
            .paginate_by(limit, page)
            .load_and_count(conn)?)
    }

    /// Fuzzy search over username, first+last name and email, same shape as
    /// the historical `find` query: exact LIKE first, SOUNDEX+levenshtein as
    /// a fallback for typos.
    #[tracing::instrument(err, skip_all)]
    pub fn find(conn: &mut DbConnection, search_str: &str) -> Result<Vec<User>> {
        let search_str = search_str.replace('%', "").trim().to_lowercase();

        if search_str.is_empty() {
            return Ok(vec![]);
        }

        let like_query = format!("%{search_str}%");
        let lower_username = lower(users::username);
        let lower_first_lastname = lower(
            users::firstname
                .assume_not_null()
                .concat(" ")
                .concat(users::lastname.assume_not_null()),
        );

        let matches = users::table
            .filter(
                lower_username.like(&like_query).or(lower_first_lastname
                    .like(&like_query)
                    .or(lower(users::email.assume_not_null()).like(&like_query))
                    .or(soundex(lower_username)
                        .eq(soundex(&search_str))
                        .and(levenshtein(lower_username, &search_str).lt(5)))
                    .or(soundex(lower_first_lastname)
                        .eq(soundex(&search_str))
                        .and(levenshtein(lower_first_lastname, &search_str).lt(5)))),
            )
            .order_by(levenshtein(lower_username, &search_str))
            .then_order_by(users::id)
            .limit(5)
            .load(conn)?;

        Ok(matches)
    }

    /// The union of ACLs granted directly and ACLs obtained transitively
    /// through roles.
    #[tracing::instrument(err, skip_all)]
    pub fn permissions(&self, conn: &mut DbConnection) -> Result<BTreeSet<String>> {
        let direct: Vec<String> = user_acls::table
            .inner_join(acls::table)
            .filter(user_acls::user_id.eq(&self.id))
            .select(acls::key)
            .load(conn)?;

        let via_roles: Vec<String> = user_roles::table
            .inner_join(roles::table.inner_join(role_acls::table.inner_join(acls::table)))
            .filter(user_roles::user_id.eq(&self.id))
            .select(acls::key)
            .load(conn)?;

        Ok(direct.into_iter().chain(via_roles).collect())
    }

    /// Resolves this user into the [`Principal`] it authenticates as.
    #[tracing::instrument(err, skip_all)]
    pub fn to_principal(&self, conn: &mut DbConnection) -> Result<Principal> {
        Ok(Principal::User(UserPrincipal {
            id: self.id.clone(),
            permissions: self.permissions(conn)?,
        }))
    }

    /// All ACLs known to the system, used by an administrative UI to offer
    /// the full capability catalogue.
    #[tracing::instrument(err, skip_all)]
    pub fn all_acls(conn: &mut DbConnection) -> Result<Vec<Acl>> {
        Ok(acls::table.load(conn)?)
    }
}

/// Lowercases and strips everything but ASCII alphanumerics and `-`/`_`, so
/// the stored username is always a URL-safe slug.
pub fn slugify(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub oauth_uid: Option<String>,
    pub preferences: Json,
}

impl NewUser {
    pub fn new(username: &str) -> Self {
        Self {
            username: slugify(username),
            firstname: None,
            lastname: None,
            email: None,
            phone: None,
            oauth_uid: None,
            preferences: Json::Object(Default::default()),
        }
    }

    #[tracing::instrument(err, skip_all)]
    pub fn insert(self, conn: &mut DbConnection) -> Result<User> {
        Ok(self.insert_into(users::table).get_result(conn)?)
    }
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUser<'a> {
    pub firstname: Option<Option<&'a str>>,
    pub lastname: Option<Option<&'a str>>,
    pub email: Option<Option<&'a str>>,
    pub phone: Option<Option<&'a str>>,
    pub preferences: Option<Json>,
    pub expiration_date: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UpdateUser<'_> {
    #[tracing::instrument(err, skip_all)]
    pub fn apply(self, conn: &mut DbConnection, id: UserId) -> Result<User> {
        Ok(diesel::update(users::table.find(id))
            .set(self)
            .get_result(conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_lowercases_and_strips() {
        assert_eq!(slugify("  Jane Doe! "), "jane-doe-");
        assert_eq!(slugify("ÄLPHA_1"), "-lpha_1");
    }
}
