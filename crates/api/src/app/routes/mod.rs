//! HTTP routes, grouped by resource.

use axum::{
    Router,
    routing::get,
};

pub mod auth;
pub mod posts;
pub mod roles;
pub mod system;
pub mod users;

/// Routes that require an authenticated, authorized caller.
///
/// Paths are absolute (no nesting) so the first path segment seen by the
/// authorization layer is the resource module.
pub fn protected_router() -> Router {
    Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/roles/:id",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
}
