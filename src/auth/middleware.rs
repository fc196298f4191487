//! Authentication gate for protected routes

use axum::{
    extract::{Extension, Request},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::codec::TokenError;
use super::context::AuthContext;
use crate::common::{safe_email_log, safe_token_log, ApiError, AppState};

/// Header carrying the access token
pub const TOKEN_HEADER: &str = "token";

/// Pull the raw token out of the request headers.
///
/// The `token` header wins; `Authorization: Bearer <token>` is the fallback.
/// Empty values count as absent. A header that is present but not visible
/// ASCII is malformed.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, TokenError> {
    if let Some(token) = readable(headers, TOKEN_HEADER)?
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Ok(Some(token.to_string()));
    }

    Ok(readable(headers, AUTHORIZATION.as_str())?
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string))
}

fn readable<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, TokenError> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| TokenError::Malformed))
        .transpose()
}

/// Verifies the request token and attaches an [`AuthContext`].
///
/// Any failure short-circuits with a structured error; the inner handler
/// never runs.
pub async fn authenticate(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let extracted = extract_token(request.headers()).map_err(|e| {
        warn!(path = %request.uri().path(), "Authentication failed: unreadable token header");
        ApiError::from(e)
    })?;

    let token = match extracted {
        Some(token) => token,
        None => {
            warn!(path = %request.uri().path(), "Authentication failed: no token header provided");
            return Err(ApiError::MissingCredential);
        }
    };

    let claims = state.codec.parse_and_verify(&token).map_err(|e| {
        warn!(
            error = %e,
            token = %safe_token_log(&token),
            path = %request.uri().path(),
            "Authentication failed: token rejected"
        );
        ApiError::from(e)
    })?;

    let context = AuthContext::from(claims);
    debug!(
        user_id = %context.subject_id,
        email = %safe_email_log(&context.email),
        role = ?context.role,
        "Request authenticated"
    );

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
