// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use baselayer_db::DbConnection;
use baselayer_db_storage::users::{NewUser, User};
use serde_json::json;

pub fn make_user(conn: &mut DbConnection, firstname: &str, lastname: &str) -> User {
    NewUser {
        firstname: Some(firstname.into()),
        lastname: Some(lastname.into()),
        email: Some(format!(
            "{}.{}@example.org",
            firstname.to_lowercase(),
            lastname.to_lowercase()
        )),
        preferences: json!({}),
        ..NewUser::new(&format!("{firstname}{lastname}"))
    }
    .insert(conn)
    .unwrap()
}
