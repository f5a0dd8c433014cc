use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use warden_auth::StoreError;
use warden_core::PostId;
use warden_infra::{NewPost, Post, PostUpdate};

use crate::app::AppState;
use crate::app::errors::{ApiError, ApiResult};
use crate::context::CallerContext;

fn parse_id(raw: &str) -> ApiResult<PostId> {
    raw.parse().map_err(ApiError::Domain)
}

async fn load(state: &AppState, id: PostId) -> ApiResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or(ApiError::Store(StoreError::NotFound))
}

/// GET /posts
pub async fn list_posts(Extension(state): Extension<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.posts.list().await?))
}

/// POST /posts
pub async fn create_post(
    Extension(state): Extension<Arc<AppState>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<NewPost>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let post = Post::create(caller.user_id(), new, Utc::now())?;
    let post = state.posts.create(post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts/:id
pub async fn get_post(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(load(&state, parse_id(&id)?).await?))
}

/// PUT /posts/:id
pub async fn update_post(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<PostUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let Json(update) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut post = load(&state, id).await?;
    post.apply(update, Utc::now())?;
    Ok(Json(state.posts.update_by_id(id, post).await?))
}

/// DELETE /posts/:id
pub async fn delete_post(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.posts.delete_by_id(parse_id(&id)?).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Store(StoreError::NotFound))
    }
}
