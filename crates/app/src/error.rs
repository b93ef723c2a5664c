// SPDX-FileCopyrightText: Baselayer contributors
//
// SPDX-License-Identifier: Apache-2.0

//! The success/error envelope every handler responds with, and the error
//! kinds a handler can raise.

use actix_web::{body::BoxBody, http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

/// `{"status":"success","data":<any>}` — wraps any serializable payload.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    status: &'static str,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { status: "success", data }
    }
}

impl<T: Serialize> actix_web::Responder for ApiResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &actix_web::HttpRequest) -> HttpResponse {
        HttpResponse::Ok().json(&self)
    }
}

/// The error kinds a handler can raise, independent of how they were
/// produced; each maps to exactly one HTTP status.
#[derive(Debug)]
pub enum ApiError {
    /// No credentials presented.
    AuthMissing,
    /// Credentials present but unparseable or expired.
    AuthInvalid,
    /// Credentials valid, user expired.
    AccountInactive,
    /// Authorization failed at row level; the session transaction was
    /// rolled back.
    AccessDenied(String),
    /// Primary-key lookup missed.
    NotFound,
    /// Malformed JSON body or wrong content type.
    BadRequest(String),
    /// Anything else: a database or internal error the caller can't act on.
    Internal(anyhow::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::AuthMissing => write!(f, "no credentials presented"),
            ApiError::AuthInvalid => write!(f, "credentials are invalid or expired"),
            ApiError::AccountInactive => write!(f, "this account has expired"),
            ApiError::AccessDenied(msg) => write!(f, "{msg}"),
            ApiError::NotFound => write!(f, "not found"),
            ApiError::BadRequest(msg) => write!(f, "{msg}"),
            ApiError::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthMissing | ApiError::AuthInvalid | ApiError::AccessDenied(_) => StatusCode::UNAUTHORIZED,
            ApiError::AccountInactive => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(e) = self {
            log::error!("internal error: {e:#}");
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "status": "error",
            "message": self.to_string(),
        }))
    }
}

impl From<baselayer_session::AccessError> for ApiError {
    fn from(err: baselayer_session::AccessError) -> Self {
        match err {
            baselayer_session::AccessError::Denied { .. } => ApiError::AccessDenied(err.to_string()),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<baselayer_db::DatabaseError> for ApiError {
    fn from(err: baselayer_db::DatabaseError) -> Self {
        match err {
            baselayer_db::DatabaseError::NotFound => ApiError::NotFound,
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<baselayer_acl::AclError> for ApiError {
    fn from(err: baselayer_acl::AclError) -> Self {
        ApiError::Internal(err.into())
    }
}
