// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

table! {
    users (id) {
        id -> Int8,
        username -> Text,
        firstname -> Nullable<Text>,
        lastname -> Nullable<Text>,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        oauth_uid -> Nullable<Text>,
        preferences -> Jsonb,
        expiration_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    tokens (id) {
        id -> Text,
        name -> Text,
        created_by_id -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    acls (id) {
        id -> Int8,
        key -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    roles (id) {
        id -> Int8,
        key -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    role_acls (role_id, acl_id) {
        role_id -> Int8,
        acl_id -> Int8,
    }
}

table! {
    user_roles (user_id, role_id) {
        user_id -> Int8,
        role_id -> Int8,
    }
}

table! {
    user_acls (user_id, acl_id) {
        user_id -> Int8,
        acl_id -> Int8,
    }
}

table! {
    token_acls (token_id, acl_id) {
        token_id -> Text,
        acl_id -> Int8,
    }
}

joinable!(tokens -> users (created_by_id));
joinable!(role_acls -> roles (role_id));
joinable!(role_acls -> acls (acl_id));
joinable!(user_roles -> users (user_id));
joinable!(user_roles -> roles (role_id));
joinable!(user_acls -> users (user_id));
joinable!(user_acls -> acls (acl_id));
joinable!(token_acls -> tokens (token_id));
joinable!(token_acls -> acls (acl_id));

allow_tables_to_appear_in_same_query!(
    users,
    tokens,
    acls,
    roles,
    role_acls,
    user_roles,
    user_acls,
    token_acls,
);
