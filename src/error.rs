//! Unified error handling
//!
//! [`AppError`] is the single error type returned by HTTP handlers. It
//! renders the API error envelope `{"error": ..., "details": ...}` and maps
//! each variant to its HTTP status. 5xx variants are logged before they are
//! rendered; business errors pass through to the client verbatim.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Application-level Result type used by HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing, malformed or out-of-range input (400)
    #[error("{0}")]
    Validation(String),

    /// Entity absent, or owned by another shop (404)
    #[error("{0}")]
    NotFound(String),

    /// Wrong HTTP method on a known path (405)
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Host platform returned no usable data (500)
    #[error("{message}")]
    Upstream { message: String, details: String },

    /// Storage or other unexpected failure (500)
    #[error("{message}")]
    Internal { message: String, details: String },
}

/// Error envelope sent to clients
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Wrap an unexpected failure, keeping the cause for the `details` field
    pub fn internal(msg: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Internal {
            message: msg.into(),
            details: cause.to_string(),
        }
    }

    /// Wrap a host-platform failure
    pub fn upstream(msg: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Upstream {
            message: msg.into(),
            details: cause.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody {
                    error: "Method not allowed".to_string(),
                    details: None,
                },
            ),
            AppError::Upstream { message, details } => {
                error!(target: "catalog", error = %details, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: message,
                        details: Some(details),
                    },
                )
            }
            AppError::Internal { message, details } => {
                error!(error = %details, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: message,
                        details: Some(details),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("Multipart error: {e}"))
    }
}
