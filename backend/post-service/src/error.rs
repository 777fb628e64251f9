/// Error types for Post Service
///
/// Every failure is one of a small set of kinds. Each kind maps to a fixed
/// HTTP status and a fixed `code` string so that clients can branch on the
/// error without parsing the message.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced post or community does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor is not the owner of the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or invalid credentials at the HTTP boundary
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                "internal_error"
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Storage and database details stay in the logs.
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.public_message(),
            "code": self.code(),
            "status": status.as_u16(),
        }))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Malformed JSON body: {}", err))
    }
}
