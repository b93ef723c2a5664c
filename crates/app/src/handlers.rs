// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Demo HTTP handlers exercising the full stack: authenticated principal
//! resolution, the verified session, the access-control algebra and the
//! fan-out plane's websocket token issuance.

use crate::auth::AuthenticatedPrincipal;
use crate::entities::{ROLES, USERS};
use crate::error::{ApiError, ApiResponse};
use actix_web::{delete, get, post, web, Responder};
use baselayer_acl::Acl;
use baselayer_db::Db;
use baselayer_db_storage::acls::Acl as AclRow;
use baselayer_db_storage::roles::{NewRole, Role};
use baselayer_db_storage::tokens::{NewToken, Token};
use baselayer_db_storage::users::User;
use baselayer_fanout::{issue_token, PushClient, Target};
use baselayer_session::{LeakPolicy, VerifiedSession};
use baselayer_types::core::AclId;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// `GET /api/me` — a principal may always read its own identity, so this
/// bypasses the access-control algebra entirely rather than registering a
/// self-referential policy for it.
#[get("/api/me")]
pub async fn me(principal: AuthenticatedPrincipal, db: web::Data<Db>) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;
    let body = web::block(move || {
        let mut conn = db.get_conn()?;
        let user = User::get(&mut conn, principal.effective_user_id())?;
        Ok::<_, ApiError>(json!({
            "id": user.id.into_inner(),
            "username": user.username,
            "permissions": principal.permissions(),
        }))
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(ApiResponse::new(body))
}

/// `GET /api/users` — admin-only listing, fully routed through the
/// verified session: every row is tracked as read and checked in bulk at
/// commit time.
#[get("/api/users")]
pub async fn list_users(
    principal: AuthenticatedPrincipal,
    db: web::Data<Db>,
    acl: web::Data<Acl>,
) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;
    let acl = acl.get_ref().clone();

    let body = web::block(move || {
        let mut conn = db.get_conn()?;
        let accessible = acl.get_all(&mut conn, USERS.table, baselayer_acl::AccessMode::Read, &principal)?;
        let users = User::get_all_by_ids(&mut conn, &accessible.into_iter().map(baselayer_types::core::UserId::from).collect::<Vec<_>>())?;

        let mut session = VerifiedSession::new(&mut conn, principal, acl, LeakPolicy::Strict);
        for user in &users {
            session.track_read(USERS.table, user.id.clone().into_inner());
        }
        session.commit()?;

        Ok::<_, ApiError>(
            users
                .iter()
                .map(|u| json!({"id": *u.id.inner(), "username": u.username}))
                .collect::<Vec<_>>(),
        )
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(ApiResponse::new(body))
}

#[derive(Debug, Deserialize)]
pub struct NewRoleBody {
    pub key: String,
}

/// `POST /api/roles` — admin-only creation. The row is inserted, then
/// checked against the `Create` policy, which for `roles` is `Restricted`:
/// a non-admin's request rolls back with [`ApiError::AccessDenied`].
#[post("/api/roles")]
pub async fn create_role(
    principal: AuthenticatedPrincipal,
    db: web::Data<Db>,
    acl: web::Data<Acl>,
    body: web::Json<NewRoleBody>,
) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;
    let acl = acl.get_ref().clone();
    let key = body.into_inner().key;

    let body = web::block(move || {
        let mut conn = db.get_conn()?;
        let mut session = VerifiedSession::new(&mut conn, principal, acl, LeakPolicy::Strict);

        session.stage_create(ROLES.table, move |conn| {
            let role = NewRole::new(key).insert(conn)?;
            Ok(role.id.into_inner())
        });
        session.commit()?;

        Ok::<_, ApiError>(json!({"created": true}))
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(ApiResponse::new(body))
}

/// `DELETE /api/roles/{id}` — admin-only deletion, staged and verified
/// against the `Delete` policy before the row is gone.
#[delete("/api/roles/{id}")]
pub async fn delete_role(
    principal: AuthenticatedPrincipal,
    db: web::Data<Db>,
    acl: web::Data<Acl>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;
    let acl = acl.get_ref().clone();
    let id = path.into_inner();
    let role_id = baselayer_types::core::RoleId::from(id);

    web::block(move || {
        let mut conn = db.get_conn()?;
        let mut session = VerifiedSession::new(&mut conn, principal, acl, LeakPolicy::Strict);

        session.stage_delete(ROLES.table, id, move |conn| Ok(Role::delete(conn, role_id)?));
        session.commit()?;
        Ok::<_, ApiError>(())
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(ApiResponse::new(json!({"deleted": true})))
}

#[derive(Debug, Deserialize)]
pub struct NewTokenBody {
    pub name: String,
    #[serde(default)]
    pub acls: Vec<String>,
}

/// `GET /api/tokens` — every bearer token the caller created. Ownership is
/// the authorization: the query is already scoped to the caller, so there
/// is nothing further to verify.
#[get("/api/tokens")]
pub async fn list_tokens(
    principal: AuthenticatedPrincipal,
    db: web::Data<Db>,
) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;

    let body = web::block(move || {
        let mut conn = db.get_conn()?;
        let tokens = Token::get_all_for_user(&mut conn, principal.effective_user_id())?;
        Ok::<_, ApiError>(
            tokens
                .iter()
                .map(|t| json!({"id": t.id, "name": t.name}))
                .collect::<Vec<_>>(),
        )
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(ApiResponse::new(body))
}

/// `POST /api/tokens` — issues a token on behalf of the caller. The
/// requested ACLs must be a subset of the caller's own permissions; this
/// delegation-subset rule is the issuing handler's responsibility, not the
/// database's.
#[post("/api/tokens")]
pub async fn create_token(
    principal: AuthenticatedPrincipal,
    db: web::Data<Db>,
    body: web::Json<NewTokenBody>,
) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;
    let body = body.into_inner();

    for key in &body.acls {
        if !principal.has_permission(key) {
            return Err(ApiError::BadRequest(format!("cannot delegate an ACL you do not hold: {key}")));
        }
    }

    let body = web::block(move || {
        let mut conn = db.get_conn()?;
        let mut acl_ids: Vec<AclId> = Vec::with_capacity(body.acls.len());
        for key in &body.acls {
            let acl = AclRow::get_by_key(&mut conn, key)?.ok_or_else(|| ApiError::BadRequest(format!("unknown ACL: {key}")))?;
            acl_ids.push(acl.id);
        }

        let token = NewToken::new(body.name, principal.effective_user_id(), acl_ids).insert(&mut conn)?;
        Ok::<_, ApiError>(json!({"id": token.id, "name": token.name}))
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(ApiResponse::new(body))
}

/// `DELETE /api/tokens/{id}` — a caller may only revoke a token it created.
#[delete("/api/tokens/{id}")]
pub async fn revoke_token(
    principal: AuthenticatedPrincipal,
    db: web::Data<Db>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;
    let token_id = baselayer_types::core::TokenId::from(path.into_inner());

    web::block(move || {
        let mut conn = db.get_conn()?;
        let token = Token::get(&mut conn, &token_id)?.ok_or(ApiError::NotFound)?;
        if token.created_by_id != principal.effective_user_id() {
            return Err(ApiError::NotFound);
        }
        Token::revoke(&mut conn, &token_id)?;
        Ok::<_, ApiError>(())
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(ApiResponse::new(json!({"revoked": true})))
}

/// `GET /socket_auth_token` — issues a short-lived JWT authorizing the
/// caller's websocket connection to subscribe to its own fan-out messages.
#[get("/socket_auth_token")]
pub async fn socket_auth_token(principal: AuthenticatedPrincipal, secret: web::Data<Arc<[u8]>>) -> Result<impl Responder, ApiError> {
    let AuthenticatedPrincipal(principal) = principal;
    let token = issue_token(secret.get_ref().as_ref(), principal.effective_user_id());
    Ok(ApiResponse::new(json!({"token": token})))
}

/// Used by an application's own handlers to push a fan-out notification
/// after a successful mutation; kept here as a thin, documented wrapper so
/// `main.rs` only has to register one more piece of shared state.
pub fn notify(push: &PushClient, target: Target, action_type: &str, payload: serde_json::Value) {
    if let Err(e) = push.push(target, action_type, payload) {
        log::warn!("failed to push fan-out notification: {e}");
    }
}
