//! Per-request authorization context

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use super::models::{Claims, Role};
use crate::common::ApiError;

/// Verified claim fields of the current request.
///
/// Inserted into the request extensions by the authentication gate and
/// dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject_id: String,
    pub email: String,
    pub first_name: String,
    pub role: Option<Role>,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.uid,
            email: claims.email,
            first_name: claims.first_name,
            role: claims.role,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when the route sits behind the gate
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(ApiError::MissingCredential)
    }
}
