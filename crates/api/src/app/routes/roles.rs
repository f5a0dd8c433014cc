use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use warden_auth::{Permission, Role, RoleFilter, RoleName, StoreError};
use warden_core::{RoleId, require_non_blank};

use crate::app::AppState;
use crate::app::errors::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<Permission>>,
}

fn parse_id(raw: &str) -> ApiResult<RoleId> {
    raw.parse().map_err(ApiError::Domain)
}

async fn load(state: &AppState, id: RoleId) -> ApiResult<Role> {
    state
        .roles
        .find_by_id(id)
        .await?
        .ok_or(ApiError::Store(StoreError::NotFound))
}

/// GET /roles
pub async fn list_roles(Extension(state): Extension<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.roles.find_by_filter(&RoleFilter::All).await?))
}

/// POST /roles
pub async fn create_role(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    require_non_blank("name", &body.name)?;

    let role = state.roles.create(Role::new(body.name, body.permissions)).await?;
    info!(role = %role.name, role_id = %role.id, "role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /roles/:id
pub async fn get_role(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(load(&state, parse_id(&id)?).await?))
}

/// PUT /roles/:id
///
/// Takes effect on the next request of every member; identities hold role ids.
pub async fn update_role(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let Json(update) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut role = load(&state, id).await?;

    if let Some(name) = update.name {
        require_non_blank("name", &name)?;
        role.name = RoleName::new(name);
    }
    if let Some(permissions) = update.permissions {
        role.permissions = permissions;
    }

    let role = state.roles.update_by_id(id, role).await?;
    info!(role = %role.name, role_id = %role.id, "role updated");
    Ok(Json(role))
}

/// DELETE /roles/:id
///
/// Members keep the dangling id; it is dropped when their roles are loaded.
pub async fn delete_role(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.roles.delete_by_id(parse_id(&id)?).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Store(StoreError::NotFound))
    }
}
