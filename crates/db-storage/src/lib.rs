#![allow(clippy::extra_unused_lifetimes)]

//! The ORM layer and embedded migrations for Baselayer's core entities:
//! users, tokens, ACLs, roles, and their join tables.
//!
//! Builds on [`baselayer_db`] for pooling and error types. Each entity
//! module owns its own queries; there is no repository trait, following
//! the shape of a storage crate with one module per table.

#[macro_use]
extern crate diesel;

use diesel::sql_types::{Integer, Text};

mod schema;

pub mod acls;
pub mod migrations;
pub mod roles;
pub mod tokens;
pub mod users;

sql_function!(fn lower(x: Text) -> Text);
sql_function!(fn levenshtein(x: Text, y: Text) -> Integer);
sql_function!(fn soundex(x: Text) -> Text);

pub mod sql_types {
    pub use diesel::sql_types::*;
}
