//! Registration and login. Both are public; registration runs behind the
//! role-assignment stage, which has already turned role names into ids.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use warden_auth::NewIdentity;
use warden_core::RoleId;

use crate::app::AppState;
use crate::app::errors::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register
///
/// Direct permissions cannot be self-granted here; they are set by a
/// privileged caller through `PUT /users/:id`.
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let created = state
        .accounts
        .register(NewIdentity {
            username: body.username,
            email: body.email,
            password: body.password,
            permissions: Vec::new(),
            roles: body.roles,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /auth/login
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let outcome = state.accounts.login(&body.email, &body.password).await?;

    Ok(Json(json!({
        "token": outcome.token,
        "user": outcome.identity,
    })))
}
