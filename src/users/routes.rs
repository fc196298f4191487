// src/users/routes.rs

use axum::{middleware, routing::get, Router};

use super::handlers;
use crate::auth::middleware::authenticate;

/// Identity read routes, all behind the authentication gate
///
/// # Routes
/// - `GET /users` - Paginated list (ADMIN)
/// - `GET /users/:user_id` - Single identity (owner or ADMIN)
pub fn users_routes() -> Router {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/:user_id", get(handlers::get_user))
        .route_layer(middleware::from_fn(authenticate))
}
