use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use warden_auth::IdentityUpdate;
use warden_core::UserId;

use crate::app::AppState;
use crate::app::errors::{ApiError, ApiResult};

fn parse_id(raw: &str) -> ApiResult<UserId> {
    raw.parse().map_err(ApiError::Domain)
}

/// GET /users
pub async fn list_users(Extension(state): Extension<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.accounts.list().await?))
}

/// GET /users/:id
pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.accounts.get(parse_id(&id)?).await?))
}

/// PUT /users/:id
///
/// Partial update; a new digest is computed only when `password` is present.
pub async fn update_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<IdentityUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let Json(update) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(state.accounts.update(id, update).await?))
}

/// DELETE /users/:id
pub async fn delete_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.accounts.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
