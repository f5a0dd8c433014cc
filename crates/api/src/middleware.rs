//! Request pipeline stages: authenticate, authorize, resolve roles.
//!
//! Each stage ends the request with an error response on failure; handlers
//! only ever see requests that passed every stage in front of them.

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::{MatchedPath, State},
    http::{Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use warden_auth::{AuthError, Method};

use crate::app::AppState;
use crate::app::errors::{ApiError, auth_error_to_response, json_error};
use crate::context::CallerContext;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Verify the bearer token and attach the caller's identity.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let identity = match state.identities.authenticate_header(header.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => return auth_error_to_response(e),
    };

    req.extensions_mut().insert(CallerContext::new(identity));
    next.run(req).await
}

/// Decide `{module}_{scope}` for the request against the attached identity.
///
/// The module comes from the matched route template, so only routed modules
/// ever reach the requirement table; an unrouted path is a 404. Must run
/// after [`authenticate`].
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(caller) = req.extensions().get::<CallerContext>().cloned() else {
        return auth_error_to_response(AuthError::TokenMissing);
    };

    let Some(route) = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
    else {
        return json_error(StatusCode::NOT_FOUND, "not_found", "not found");
    };

    let Ok(method) = req.method().as_str().parse::<Method>() else {
        debug!(method = %req.method(), "no requirement entry for method");
        return auth_error_to_response(AuthError::PermissionDenied(String::new()));
    };

    let decision = match state
        .permissions
        .authorize(caller.identity(), method, &route)
    {
        Ok(decision) => decision,
        Err(e) => return auth_error_to_response(e),
    };

    debug!(
        user_id = %caller.user_id(),
        required = %decision.required,
        matched = %decision.matched,
        source = ?decision.source,
        "request authorized"
    );
    next.run(req).await
}

/// Replace requested role names in an identity-creation body with role ids.
pub async fn assign_roles(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::bad_request("request body too large").into_response(),
    };
    let mut value: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => return ApiError::bad_request(format!("invalid JSON body: {e}")).into_response(),
    };

    if let Err(e) = state.assignment.resolve_body(&mut value).await {
        return auth_error_to_response(e);
    }

    let rewritten = match serde_json::to_vec(&value) {
        Ok(bytes) => bytes,
        Err(e) => return ApiError::bad_request(e.to_string()).into_response(),
    };

    let mut req = Request::from_parts(parts, Body::from(rewritten));
    req.headers_mut().remove(axum::http::header::CONTENT_LENGTH);
    next.run(req).await
}
