//! Service error types with HTTP status code mapping.
//!
//! [`PusherError`] is the central error type. Each variant maps to a
//! specific HTTP status code and structured JSON error response. The hub
//! itself never returns errors: peer-local failures are contained at the
//! peer and resolved by unregistration.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: title must not be empty",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request           |
/// | 2000–2999 | Not Found       | 404 Not Found             |
/// | 3000–3999 | Server          | 500 Internal Server Error |
/// | 5000–5999 | Event bus       | 502 Bad Gateway           |
#[derive(Debug, thiserror::Error)]
pub enum PusherError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Feed with the given ID was not found.
    #[error("feed not found: {0}")]
    FeedNotFound(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// The event bus rejected a publish or subscribe, or is closed.
    #[error("event bus error: {0}")]
    EventBus(String),

    /// A notification could not be encoded for the bus or the wire.
    #[error("encode error: {0}")]
    Encode(String),

    /// A bus frame could not be decoded into a notification.
    #[error("decode error: {0}")]
    Decode(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PusherError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::FeedNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Encode(_) => 3002,
            Self::EventBus(_) => 5001,
            Self::Decode(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::FeedNotFound(_) => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) | Self::Encode(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::EventBus(_) | Self::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for PusherError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for PusherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
