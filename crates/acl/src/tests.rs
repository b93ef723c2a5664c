// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use crate::{EntityRegistry, EntitySpec, Policy, Relationship};
use baselayer_types::core::UserId;
use baselayer_types::{Principal, UserPrincipal};
use std::collections::BTreeSet;

const DOCUMENTS: EntitySpec = EntitySpec {
    table: "documents",
    id_column: "id",
    relationships: &[Relationship {
        name: "owner",
        local_column: "owner_id",
        related_entity: "users",
        related_column: "id",
    }],
};

const USERS: EntitySpec = EntitySpec {
    table: "users",
    id_column: "id",
    relationships: &[],
};

fn registry() -> EntityRegistry {
    EntityRegistry::builder()
        .register(
            USERS,
            Policy::Public,
            Policy::Public,
            Policy::Restricted,
            Policy::Restricted,
        )
        .unwrap()
        .register(
            DOCUMENTS,
            Policy::Public,
            Policy::AccessibleIfUserMatches(vec!["owner"]),
            Policy::AccessibleIfUserMatches(vec!["owner"]),
            Policy::Restricted,
        )
        .unwrap()
        .build()
}

fn user(id: i64, admin: bool) -> Principal {
    let mut permissions = BTreeSet::new();
    if admin {
        permissions.insert(baselayer_types::SYSTEM_ADMIN_ACL.to_string());
    }
    Principal::User(UserPrincipal {
        id: UserId::from(id),
        permissions,
    })
}

#[test]
fn empty_chain_rejected_at_construction() {
    let err = EntityRegistry::builder().register(
        DOCUMENTS,
        Policy::Public,
        Policy::AccessibleIfUserMatches(vec![]),
        Policy::Restricted,
        Policy::Restricted,
    );
    assert!(err.is_err());
}

#[test]
fn unknown_relationship_rejected_at_construction() {
    let err = EntityRegistry::builder().register(
        DOCUMENTS,
        Policy::Public,
        Policy::AccessibleIfUserMatches(vec!["nonexistent"]),
        Policy::Restricted,
        Policy::Restricted,
    );
    assert!(err.is_err());
}

#[test]
fn public_compiles_to_unconditional_select() {
    let registry = registry();
    let p = user(1, false);
    let filter = Policy::Public.compile(DOCUMENTS, &p, &registry).unwrap();
    let sql = format!("{filter:?}");
    assert!(sql.contains("documents"));
    assert!(!sql.contains("WHERE"));
}

#[test]
fn restricted_admits_only_admins() {
    let registry = registry();
    let non_admin = Policy::Restricted
        .compile(DOCUMENTS, &user(1, false), &registry)
        .unwrap();
    assert!(format!("{non_admin:?}").contains("WHERE FALSE"));

    let admin = Policy::Restricted
        .compile(DOCUMENTS, &user(1, true), &registry)
        .unwrap();
    assert!(!format!("{admin:?}").contains("WHERE FALSE"));
}

#[test]
fn user_matches_joins_the_declared_chain() {
    let registry = registry();
    let policy = Policy::AccessibleIfUserMatches(vec!["owner"]);
    let filter = policy.compile(DOCUMENTS, &user(7, false), &registry).unwrap();
    let sql = format!("{filter:?}");
    assert!(sql.contains("INNER JOIN"));
    assert!(sql.contains("owner_id"));
}

#[test]
fn admin_bypasses_user_matches() {
    let registry = registry();
    let policy = Policy::AccessibleIfUserMatches(vec!["owner"]);
    let filter = policy.compile(DOCUMENTS, &user(7, true), &registry).unwrap();
    assert!(!format!("{filter:?}").contains("INNER JOIN"));
}

#[test]
fn and_composition_skips_public_identity() {
    let registry = registry();
    let policy = Policy::Public.and(Policy::Restricted);
    let non_admin = policy.compile(DOCUMENTS, &user(1, false), &registry).unwrap();
    // Public is dropped from the conjunction; only Restricted's WHERE FALSE remains.
    assert!(format!("{non_admin:?}").contains("WHERE FALSE"));
}

#[test]
fn or_composition_is_permissive() {
    let registry = registry();
    let policy = Policy::Restricted.or(Policy::AccessibleIfUserMatches(vec!["owner"]));
    let filter = policy.compile(DOCUMENTS, &user(7, false), &registry).unwrap();
    assert!(format!("{filter:?}").contains("LEFT OUTER JOIN"));
}
