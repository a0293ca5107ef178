/// Error types for forum-service
///
/// Errors are converted to appropriate HTTP responses for API clients.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Result type for forum-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation (empty content, malformed identifiers)
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (channel, message, or scope parent)
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller identity missing or invalid
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is not allowed to act on this resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// State conflict (double publish, orphaned parent, duplicate draft)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration error (startup only)
    #[error("configuration error: {0}")]
    Config(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Config(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Never leak database/internal details to clients.
        let message = match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Config(_) => {
                tracing::error!(error = %self, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }))
    }
}
