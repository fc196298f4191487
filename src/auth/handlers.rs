//! Authentication handlers

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tracing::info;

use super::models::{Identity, LoginRequest, SignupRequest, SignupResponse};
use super::validators::{LoginValidator, SignupValidator};
use crate::common::{safe_email_log, ApiError, AppState, Validator};

/// POST /users/signup
/// Registers a new identity
///
/// # Request Body
/// ```json
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "a@x.com",
///   "phone": "5550100",
///   "password": "pw1234",
///   "role": "USER"
/// }
/// ```
///
/// # Response
/// ```json
/// { "user_id": "U_K7NP3XQ2MW" }
/// ```
pub async fn signup(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    info!(email = %safe_email_log(&payload.email), "🔐 Received signup request");

    SignupValidator.validate(&payload).into_result()?;

    let user_id = state.accounts.signup(payload).await?;
    Ok(Json(SignupResponse { user_id }))
}

/// POST /users/login
/// Verifies credentials and rotates the stored token pair
///
/// # Response
/// The identity record including the fresh `token` and `refresh_token`.
/// The credential hash is never serialized.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Identity>, ApiError> {
    info!(email = %safe_email_log(&payload.email), "🔐 Received login request");

    LoginValidator.validate(&payload).into_result()?;

    let identity = state.accounts.login(payload).await?;
    Ok(Json(identity))
}
