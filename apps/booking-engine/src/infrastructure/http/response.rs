//! HTTP response DTOs and the domain-error-to-status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::trade::{TradeError, Violation};

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service liveness.
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Error payload returned for every failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code.
    pub error: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Field-level violations for validation failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

/// Wrapper turning a [`TradeError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TradeError);

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        Self(err)
    }
}

/// HTTP status for each domain error.
///
/// Busy maps to 503 so callers know to retry with backoff; a concurrency
/// conflict maps to 409 and tells the caller to re-read. A uniqueness
/// violation means the allocator is broken and is reported as 500.
pub fn status_for_error(err: &TradeError) -> StatusCode {
    match err {
        TradeError::Validation(_) => StatusCode::BAD_REQUEST,
        TradeError::NotFound { .. } => StatusCode::NOT_FOUND,
        TradeError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
        TradeError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        TradeError::UniquenessViolation { .. }
        | TradeError::Storage(_)
        | TradeError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_code(err: &TradeError) -> &'static str {
    match err {
        TradeError::Validation(_) => "validation_failed",
        TradeError::NotFound { .. } => "not_found",
        TradeError::ConcurrencyConflict { .. } => "concurrency_conflict",
        TradeError::Busy(_) => "busy",
        TradeError::UniquenessViolation { .. }
        | TradeError::Storage(_)
        | TradeError::Snapshot(_) => "internal",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for_error(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let violations = match &self.0 {
            TradeError::Validation(failure) => failure.violations().to_vec(),
            _ => Vec::new(),
        };
        let message = match &self.0 {
            TradeError::ConcurrencyConflict { .. } => {
                format!("{}; re-read the trade and retry", self.0)
            }
            _ => self.0.to_string(),
        };

        let body = ErrorResponse {
            error: error_code(&self.0),
            message,
            violations,
        };
        (status, Json(body)).into_response()
    }
}
