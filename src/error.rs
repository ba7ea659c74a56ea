//! Tracker error types with HTTP status code mapping.
//!
//! [`TrackerError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use std::time::Duration;

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
///     "code": 1002,
///     "message": "validation failed: location too far from any keypoint",
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
/// | Range     | Category              | HTTP Status                |
/// |-----------|-----------------------|----------------------------|
/// | 1000–1099 | Input / state / geo   | 400 Bad Request            |
/// | 1400–1499 | Authentication        | 401 Unauthorized           |
/// | 2000–2999 | Not Found             | 404 Not Found              |
/// | 3000–3999 | Server                | 500 / 504                  |
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Missing or invalid caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed identifier or request body.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// Referenced tour, execution, or key point does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation not permitted for the current tour or execution status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Geographic proximity check failed.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The operation did not finish within the request deadline.
    #[error("operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Persistence or unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidInput(_) => 1001,
            Self::ValidationFailed(_) => 1002,
            Self::InvalidState(_) => 1003,
            Self::Unauthorized(_) => 1401,
            Self::NotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Timeout(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::ValidationFailed(_) | Self::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            TrackerError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            TrackerError::ValidationFailed("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TrackerError::InvalidState("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TrackerError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TrackerError::Timeout(Duration::from_secs(5)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn timeout_message_reports_millis() {
        let err = TrackerError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "operation timed out after 250ms");
    }

    #[test]
    fn response_carries_status() {
        let response = TrackerError::NotFound("tour".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
