//! Error Handling Utilities
//!
//! HTTP-facing error taxonomy for the aid service. Service-level errors are
//! converted into [`AppError`] at the API boundary.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type surfaced to API callers
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed request payloads
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, invalid or expired credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller lacks the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict errors (duplicate email, admin already bootstrapped)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Verification or reset token that does not exist or has expired
    #[error("Invalid or expired token: {0}")]
    InvalidOrExpired(String),

    /// Well-formed request that cannot be honoured
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Generic internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),
}

/// Standard error response structure for API endpoints
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

impl AppError {
    /// HTTP status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidOrExpired(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Configuration(_)
            | AppError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, message) = match self {
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                ("DATABASE_ERROR", "A database error occurred".to_string())
            }
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => ("FORBIDDEN", msg),
            AppError::NotFound(msg) => ("NOT_FOUND", msg),
            AppError::Conflict(msg) => ("CONFLICT", msg),
            AppError::InvalidOrExpired(msg) => ("INVALID_OR_EXPIRED_TOKEN", msg),
            AppError::BadRequest(msg) => ("BAD_REQUEST", msg),
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                (
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Configuration(msg) => {
                log::error!("Configuration error: {}", msg);
                ("CONFIGURATION_ERROR", "Server configuration error".to_string())
            }
            AppError::HashingError(e) => {
                log::error!("Password hashing error: {}", e);
                ("HASHING_ERROR", "Password hashing error".to_string())
            }
        };

        let error_response = ErrorResponse::new(error_code, &message);
        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Result type alias for operations that can return AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.error, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::Validation("Invalid email".to_string());
        assert_eq!(error.to_string(), "Validation error: Invalid email");
    }

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidOrExpired("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_response_carries_bearer_challenge() {
        let response = AppError::Unauthorized("Could not validate credentials".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_forbidden_response_has_no_challenge() {
        let response = AppError::Forbidden("admin required".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }
}
