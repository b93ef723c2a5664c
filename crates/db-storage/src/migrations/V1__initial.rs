// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

use barrel::backend::Pg;
use barrel::{types, Migration};

use crate::migrations::type_polyfills::datetime;

pub fn migration() -> String {
    let mut migr = Migration::new();

    migr.create_table("users", |table| {
        table.add_column("id", types::custom("BIGSERIAL").primary(true));
        table.add_column("username", types::varchar(255).unique(true).nullable(false));
        table.add_column("firstname", types::varchar(255));
        table.add_column("lastname", types::varchar(255));
        table.add_column("email", types::varchar(255));
        table.add_column("phone", types::varchar(255));
        table.add_column("oauth_uid", types::varchar(255));
        table.add_column(
            "preferences",
            types::custom("JSONB NOT NULL DEFAULT '{}'::jsonb"),
        );
        table.add_column("expiration_date", datetime().nullable(true));
        table.add_column("created_at", datetime().nullable(false));
        table.add_column("updated_at", datetime().nullable(false));
    });

    migr.create_table("tokens", |table| {
        table.add_column("id", types::varchar(32).primary(true));
        table.add_column("name", types::varchar(255).nullable(false));
        table.add_column(
            "created_by_id",
            types::custom("BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
        );
        table.add_column("created_at", datetime().nullable(false));
        table.add_column("updated_at", datetime().nullable(false));
        table.inject_custom("UNIQUE (created_by_id, name)");
    });

    migr.create_table("acls", |table| {
        table.add_column("id", types::custom("BIGSERIAL").primary(true));
        table.add_column("key", types::varchar(255).unique(true).nullable(false));
        table.add_column("created_at", datetime().nullable(false));
        table.add_column("updated_at", datetime().nullable(false));
    });

    migr.create_table("roles", |table| {
        table.add_column("id", types::custom("BIGSERIAL").primary(true));
        table.add_column("key", types::varchar(255).unique(true).nullable(false));
        table.add_column("created_at", datetime().nullable(false));
        table.add_column("updated_at", datetime().nullable(false));
    });

    migr.create_table("role_acls", |table| {
        table.add_column(
            "role_id",
            types::custom("BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "acl_id",
            types::custom("BIGINT NOT NULL REFERENCES acls(id) ON DELETE CASCADE"),
        );
        table.inject_custom("PRIMARY KEY (role_id, acl_id)");
    });

    migr.create_table("user_roles", |table| {
        table.add_column(
            "user_id",
            types::custom("BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "role_id",
            types::custom("BIGINT NOT NULL REFERENCES roles(id) ON DELETE CASCADE"),
        );
        table.inject_custom("PRIMARY KEY (user_id, role_id)");
    });

    migr.create_table("user_acls", |table| {
        table.add_column(
            "user_id",
            types::custom("BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "acl_id",
            types::custom("BIGINT NOT NULL REFERENCES acls(id) ON DELETE CASCADE"),
        );
        table.inject_custom("PRIMARY KEY (user_id, acl_id)");
    });

    migr.create_table("token_acls", |table| {
        table.add_column(
            "token_id",
            types::custom("VARCHAR(32) NOT NULL REFERENCES tokens(id) ON DELETE CASCADE"),
        );
        table.add_column(
            "acl_id",
            types::custom("BIGINT NOT NULL REFERENCES acls(id) ON DELETE CASCADE"),
        );
        table.inject_custom("PRIMARY KEY (token_id, acl_id)");
    });

    migr.make::<Pg>()
}
