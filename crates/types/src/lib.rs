// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Core data types shared by every Baselayer crate: the surrogate-key
//! newtypes for the core entities and the [`Principal`] a request
//! resolves to.
//!
//! Kept deliberately small and dependency-light (diesel + serde only) so
//! that every other crate in the workspace, including the access-control
//! algebra itself, can depend on it without pulling in the database pool
//! or the web framework.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    missing_debug_implementations,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_extern_crates,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    while_true
)]

mod macros;
mod principal;

pub mod core;

pub use principal::{Principal, TokenPrincipal, UserPrincipal, SYSTEM_ADMIN_ACL};
