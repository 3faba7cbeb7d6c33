//! Conversion forwarding errors.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ValidationError};

#[derive(Debug, Error)]
pub enum TrackingError {
    /// Required request field missing.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// No active pixel configuration with server-side sending.
    #[error("Conversion tracking is not configured")]
    NotConfigured,

    /// The ad platform answered with a non-2xx status.
    #[error("Upstream returned {status}")]
    Upstream { status: u16, body: Value },

    /// The ad platform did not answer in time.
    #[error("Upstream request timed out")]
    Timeout,

    /// Transport failure other than a timeout.
    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl TrackingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrackingError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            TrackingError::NotConfigured => StatusCode::NOT_FOUND,
            // Upstream rejections are surfaced to the caller as a bad request.
            TrackingError::Upstream { .. } => StatusCode::BAD_REQUEST,
            TrackingError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            TrackingError::Transport(_) => StatusCode::BAD_GATEWAY,
            TrackingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TrackingError::InvalidArgument(_) => "INVALID_ARGUMENT",
            TrackingError::NotConfigured => "NOT_CONFIGURED",
            TrackingError::Upstream { .. } => "UPSTREAM_ERROR",
            TrackingError::Timeout => "TIMEOUT",
            TrackingError::Transport(_) => "UPSTREAM_ERROR",
            TrackingError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrackingError::Timeout | TrackingError::Transport(_) | TrackingError::Database(_)
        )
    }

    /// The `error` field of the HTTP response. Upstream bodies pass through verbatim.
    pub fn response_error(&self) -> Value {
        match self {
            TrackingError::Upstream { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<DomainError> for TrackingError {
    fn from(err: DomainError) -> Self {
        TrackingError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_error_is_bad_request_with_verbatim_body() {
        let body = json!({"error": {"message": "Invalid parameter", "code": 100}});
        let err = TrackingError::Upstream {
            status: 400,
            body: body.clone(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.response_error(), body);
    }

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(
            TrackingError::InvalidArgument(ValidationError::empty_field("event_id")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(TrackingError::NotConfigured.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(TrackingError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn non_upstream_errors_render_as_message() {
        assert_eq!(
            TrackingError::NotConfigured.response_error(),
            json!("Conversion tracking is not configured")
        );
    }
}
