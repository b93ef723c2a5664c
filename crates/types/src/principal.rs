// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The [`Principal`] every request resolves to: either a [`User`] acting for
//! itself, or a [`Token`] acting on behalf of the user that created it.

use crate::core::{TokenId, UserId};
use std::collections::BTreeSet;

/// The sentinel ACL that marks a principal as a system administrator.
///
/// Admins bypass every non-[`Custom`](crate) access policy.
pub const SYSTEM_ADMIN_ACL: &str = "System admin";

/// Either a [`User`] or a [`Token`]; every authenticated request resolves to
/// exactly one.
#[derive(Debug, Clone)]
pub enum Principal {
    User(UserPrincipal),
    Token(TokenPrincipal),
}

/// A resolved, authenticated user together with their effective permission set.
#[derive(Debug, Clone)]
pub struct UserPrincipal {
    pub id: UserId,
    pub permissions: BTreeSet<String>,
}

/// A resolved bearer token together with the (sub)set of the creator's
/// permissions it was issued with.
#[derive(Debug, Clone)]
pub struct TokenPrincipal {
    pub id: TokenId,
    pub created_by: UserId,
    pub permissions: BTreeSet<String>,
}

impl Principal {
    /// The id of the user this principal acts as, for the purpose of
    /// `AccessibleIfUserMatches` comparisons: this is the *effective user
    /// id*, i.e. a Token's creator, not the token itself.
    pub fn effective_user_id(&self) -> UserId {
        match self {
            Principal::User(u) => u.id.clone(),
            Principal::Token(t) => t.created_by.clone(),
        }
    }

    /// The permission set this principal carries: a User's union of direct
    /// and role-derived ACLs, or a Token's delegated ACL subset.
    pub fn permissions(&self) -> &BTreeSet<String> {
        match self {
            Principal::User(u) => &u.permissions,
            Principal::Token(t) => &t.permissions,
        }
    }

    /// A principal is admin iff its permission set contains the
    /// [`SYSTEM_ADMIN_ACL`] sentinel.
    pub fn is_admin(&self) -> bool {
        self.permissions().contains(SYSTEM_ADMIN_ACL)
    }

    pub fn has_permission(&self, acl: &str) -> bool {
        self.permissions().contains(acl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, perms: &[&str]) -> Principal {
        Principal::User(UserPrincipal {
            id: UserId::from(id),
            permissions: perms.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn token(id: &str, created_by: i64, perms: &[&str]) -> Principal {
        Principal::Token(TokenPrincipal {
            id: TokenId::from(id.to_string()),
            created_by: UserId::from(created_by),
            permissions: perms.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn admin_detection() {
        assert!(user(1, &[SYSTEM_ADMIN_ACL]).is_admin());
        assert!(!user(1, &["Upload Data"]).is_admin());
        assert!(token("tok", 1, &[SYSTEM_ADMIN_ACL]).is_admin());
    }

    #[test]
    fn token_effective_user_is_creator() {
        let p = token("tok", 42, &[]);
        assert_eq!(p.effective_user_id(), UserId::from(42));
    }

    #[test]
    fn user_effective_user_is_self() {
        let p = user(42, &[]);
        assert_eq!(p.effective_user_id(), UserId::from(42));
    }
}
