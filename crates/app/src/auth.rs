// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Resolves an incoming request to a [`Principal`]: either an API bearer
//! token (`Authorization: token <opaque>`) or a browser session cookie
//! carrying a user id.

use crate::error::ApiError;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use baselayer_db::Db;
use baselayer_db_storage::tokens::Token;
use baselayer_db_storage::users::User;
use baselayer_types::{core::UserId, Principal};
use std::future::Future;
use std::pin::Pin;

const COOKIE_NAME: &str = "baselayer_user_id";

/// Extractor wrapping the [`Principal`] a request authenticated as.
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequest for AuthenticatedPrincipal {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let db = req
                .app_data::<web::Data<Db>>()
                .expect("Db is always registered as app data")
                .clone();

            if let Some(token) = bearer_token(&req) {
                return resolve_token(db, token).await;
            }
            if let Some(user_id) = cookie_user_id(&req) {
                return resolve_cookie(db, user_id).await;
            }
            Err(ApiError::AuthMissing)
        })
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(actix_web::http::header::AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("token ").map(str::to_owned)
}

fn cookie_user_id(req: &HttpRequest) -> Option<i64> {
    req.cookie(COOKIE_NAME)?.value().parse().ok()
}

async fn resolve_token(db: web::Data<Db>, raw: String) -> Result<AuthenticatedPrincipal, ApiError> {
    web::block(move || {
        let mut conn = db.get_conn()?;
        let token = Token::get(&mut conn, &baselayer_types::core::TokenId::from(raw))?.ok_or(ApiError::AuthInvalid)?;

        let creator = User::get(&mut conn, token.created_by_id.clone())?;
        if !creator.is_active() {
            return Err(ApiError::AccountInactive);
        }

        token.to_principal(&mut conn).map(AuthenticatedPrincipal).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?
}

async fn resolve_cookie(db: web::Data<Db>, user_id: i64) -> Result<AuthenticatedPrincipal, ApiError> {
    web::block(move || {
        let mut conn = db.get_conn()?;
        let user = User::get(&mut conn, UserId::from(user_id))?;
        if !user.is_active() {
            return Err(ApiError::AccountInactive);
        }
        user.to_principal(&mut conn).map(AuthenticatedPrincipal).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?
}
