// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use crate::common::make_user;
use baselayer_db_storage::users::User;
use pretty_assertions::assert_eq;
use serial_test::serial;

mod common;

#[tokio::test]
#[serial]
async fn test() {
    let db_ctx = baselayer_test_util::database::DatabaseContext::new(true).await;
    let mut conn = db_ctx.db.get_conn().unwrap();

    // generate some random users with some made up names
    make_user(&mut conn, "Aileen", "Strange");
    make_user(&mut conn, "Laura", "Rutherford");
    make_user(&mut conn, "Cheryl", "Lazarus");

    let users = User::find(&mut conn, "La").unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].firstname.as_deref(), Some("Cheryl"));
    assert_eq!(users[1].firstname.as_deref(), Some("Laura"));

    let users = User::find(&mut conn, "Ru").unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].firstname.as_deref(), Some("Laura"));
    assert_eq!(users[1].firstname.as_deref(), Some("Cheryl"));

    // Exact match on the first+last name concatenation.
    let users = User::find(&mut conn, "Cheryl Lazarus").unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].firstname.as_deref(), Some("Cheryl"));

    // Try the levenshtein/soundex matching with worse input each time.
    let users = User::find(&mut conn, "Cheril Lasarus").unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].firstname.as_deref(), Some("Cheryl"));

    // Match on the generated username instead of first+last name.
    let users = User::find(&mut conn, "aileenstrange").unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].firstname.as_deref(), Some("Aileen"));

    // Match on email.
    let users = User::find(&mut conn, "laura.rutherford@example.org").unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].firstname.as_deref(), Some("Laura"));
}
