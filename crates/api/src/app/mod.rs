//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, credential services, resolvers
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::config::Config;
use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppState, build_state};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &Config) -> anyhow::Result<Router> {
    let state = Arc::new(build_state(config).await?);
    Ok(router(state))
}

/// Route tree over an existing state.
pub fn router(state: Arc<AppState>) -> Router {
    // Protected routes: authenticate first (outer layer), then authorize.
    let protected = routes::protected_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authorize,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    let registration = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::assign_roles,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .merge(registration)
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(state)))
}
