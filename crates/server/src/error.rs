//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; responses carry a JSON `{"message": ...}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::payment::PaymentError;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront backend.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request lacks valid authentication.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to act on this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists | AuthError::AlreadyVerified => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidCode(_)
                | AuthError::WeakPassword(_)
                | AuthError::NoPendingCode
                | AuthError::CodeExpired
                | AuthError::CodeMismatch => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) | AuthError::Token(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Payment(err) => match err {
                PaymentError::Gateway(_) | PaymentError::Http(_) => StatusCode::BAD_GATEWAY,
                PaymentError::InvalidSignature | PaymentError::AmountOutOfRange(_) => {
                    StatusCode::BAD_REQUEST
                }
                PaymentError::InvalidKey => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; internal details never leak.
    fn message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::PasswordHash | AuthError::Repository(_) | AuthError::Token(_) => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            },
            Self::Payment(err) => match err {
                PaymentError::Gateway(_) | PaymentError::Http(_) => {
                    "Payment gateway error".to_string()
                }
                PaymentError::InvalidKey => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if status == StatusCode::BAD_GATEWAY {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Payment gateway failure"
            );
        }

        (status, Json(json!({ "message": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_statuses() {
        assert_eq!(
            AppError::Auth(AuthError::UserAlreadyExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("order already paid".into())).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_expired_code_is_bad_request() {
        assert_eq!(
            AppError::Auth(AuthError::CodeExpired).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_gateway_failure_is_bad_gateway() {
        assert_eq!(
            AppError::Payment(PaymentError::Gateway("declined".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_details_do_not_leak() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row".into()));
        assert_eq!(err.message(), "Internal server error");
    }
}
