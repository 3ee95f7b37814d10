//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Store unavailable; safe to retry with backoff.
    #[error("Temporarily unavailable: {0}")]
    Transient(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Upstream(m) => {
                tracing::warn!(error = %m, "upstream provider failure");
                (StatusCode::BAD_GATEWAY, "upstream_failure", "Identity provider unavailable")
            }
            AppError::Transient(m) => {
                tracing::warn!(error = %m, "store temporarily unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "temporarily_unavailable",
                    "Temporarily unavailable, retry later",
                )
            }
            AppError::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::Transient(e.to_string())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<pairly_core::auth::AuthError> for AppError {
    fn from(e: pairly_core::auth::AuthError) -> Self {
        use pairly_core::auth::AuthError;
        match e {
            AuthError::Conflict => AppError::Conflict("Email already registered".into()),
            AuthError::NotFound => AppError::NotFound("No such user".into()),
            AuthError::Unauthorized(msg) => AppError::Unauthorized(msg),
            AuthError::Upstream(msg) => AppError::Upstream(msg),
            AuthError::Db(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<pairly_core::notify::NotifyError> for AppError {
    fn from(e: pairly_core::notify::NotifyError) -> Self {
        use pairly_core::notify::NotifyError;
        match e {
            NotifyError::NotFound => AppError::NotFound("Notification not found".into()),
            NotifyError::Db(e) => AppError::from(e),
            NotifyError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
