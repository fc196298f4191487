//! Authentication routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /users/signup` - Register a new identity
/// - `POST /users/login` - Exchange credentials for a fresh token pair
pub fn auth_routes() -> Router {
    Router::new()
        .route("/users/signup", post(handlers::signup))
        .route("/users/login", post(handlers::login))
}
