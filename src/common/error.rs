// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::error;

use super::validation::ValidationResult;
use crate::auth::access::AccessDenied;
use crate::auth::codec::TokenError;
use crate::auth::service::AccountError;
use crate::store::StoreError;

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized: no authorization token provided")]
    MissingCredential,

    #[error("Unauthorized: {0}")]
    Token(TokenError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Internal Server Error: {0}")]
    InternalServer(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database Error: {0}")]
    DatabaseError(StoreError),
}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                "no authorization header provided".to_string(),
                "MISSING_CREDENTIAL",
            ),
            ApiError::Token(e) => {
                let code = match e {
                    TokenError::Malformed => "MALFORMED_TOKEN",
                    TokenError::InvalidSignature => "INVALID_SIGNATURE",
                    TokenError::Expired => "TOKEN_EXPIRED",
                    TokenError::Signing(_) => "INTERNAL_SERVER_ERROR",
                };
                if let TokenError::Signing(_) = e {
                    error!(error = %e, "Token signing failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "token issuance failed".to_string(),
                        code,
                    )
                } else {
                    (StatusCode::UNAUTHORIZED, e.to_string(), code)
                }
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                msg,
                "SERVICE_UNAVAILABLE",
            ),
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Token(e)
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        ApiError::Forbidden(denied.reason)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ApiError::NotFound("identity not found".to_string()),
            StoreError::Duplicate(field) => ApiError::BadRequest(format!("{} already in use", field)),
            StoreError::Timeout(_) => {
                error!(error = %e, "Identity store timed out");
                ApiError::ServiceUnavailable("identity store timed out".to_string())
            }
            StoreError::Database(_) => ApiError::DatabaseError(e),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::DuplicateEmail | AccountError::DuplicatePhone => {
                ApiError::BadRequest(e.to_string())
            }
            AccountError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AccountError::Token(token_err) => ApiError::Token(token_err),
            AccountError::Store(store_err) => store_err.into(),
            AccountError::Hash(_) | AccountError::Task(_) => {
                error!(error = %e, "Credential processing failed");
                ApiError::InternalServer("credential processing failed".to_string())
            }
        }
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IdentityField;
    use std::time::Duration;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_token_rejections_are_unauthorized() {
        assert_eq!(status_of(ApiError::MissingCredential), StatusCode::UNAUTHORIZED);
        for e in [
            TokenError::Malformed,
            TokenError::InvalidSignature,
            TokenError::Expired,
        ] {
            assert_eq!(status_of(e.into()), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_denial_is_forbidden() {
        let denied = AccessDenied {
            reason: "unauthorized to access this resource".to_string(),
        };
        assert_eq!(status_of(denied.into()), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_store_errors_map_to_server_side_statuses() {
        assert_eq!(
            status_of(StoreError::Timeout(Duration::from_secs(30)).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(StoreError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StoreError::Duplicate(IdentityField::Email).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_account_errors() {
        assert_eq!(
            status_of(AccountError::DuplicateEmail.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AccountError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_validation_result_conversion() {
        let mut result = ValidationResult::new();
        result.add_error("email", "A valid email address is required");
        match ApiError::from(result) {
            ApiError::ValidationError(msg) => {
                assert_eq!(msg, "email: A valid email address is required")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
