// src/logging_middleware.rs
//! Middleware for per-request access logging
//!
//! Bodies are never logged: they carry passwords and tokens. The token header
//! is reduced to its masked form.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::middleware::extract_token;
use crate::common::safe_token_log;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs method, path, status and latency for every request and echoes a
/// request id back to the caller
pub async fn log_request_response(mut request: Request, next: Next) -> Response {
    let started = Instant::now();

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let token = extract_token(request.headers())
        .ok()
        .flatten()
        .map(|t| safe_token_log(&t))
        .unwrap_or_else(|| "-".to_string());

    let mut response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            elapsed_ms = elapsed_ms,
            token = %token,
            "📤 Request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            elapsed_ms = elapsed_ms,
            token = %token,
            "📤 Request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}
