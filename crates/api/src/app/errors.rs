//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use warden_auth::{AuthError, StoreError};
use warden_core::DomainError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn internal_error() -> Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "unexpected failure",
    )
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Backend(msg) => {
            error!(error = %msg, "store failure");
            internal_error()
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::CredentialInvalid => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        ),
        e @ (AuthError::TokenMissing | AuthError::TokenInvalid | AuthError::TokenExpired) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
        }
        AuthError::IdentityNotFound => json_error(
            StatusCode::BAD_REQUEST,
            "identity_not_found",
            "identity not found",
        ),
        AuthError::PermissionDenied(_) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "permission denied")
        }
        AuthError::NoMatchingRoles => json_error(
            StatusCode::NOT_FOUND,
            "no_matching_roles",
            "none of the requested roles exist",
        ),
        AuthError::EmailInUse => {
            json_error(StatusCode::CONFLICT, "email_in_use", "email already in use")
        }
        AuthError::Crypto(msg) => {
            error!(error = %msg, "credential primitive failure");
            internal_error()
        }
        AuthError::Invalid(e) => domain_error_to_response(e),
        AuthError::Store(e) => store_error_to_response(e),
    }
}

/// Handler-level error; every variant renders through the mappers above.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Store(StoreError),
    Domain(DomainError),
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => auth_error_to_response(e),
            ApiError::Store(e) => store_error_to_response(e),
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
