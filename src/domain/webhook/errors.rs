//! Inbound webhook error types.
//!
//! Every receiver failure maps onto an HTTP status. Duplicate deliveries are
//! not errors and never appear here.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

use super::Provider;

/// Errors that occur while receiving a provider webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Body is not valid JSON.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// No active endpoint is configured for the provider.
    #[error("No active webhook endpoint configured for {0}")]
    NotConfigured(Provider),

    /// Shared secret missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// Required HMAC signature missing or wrong.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Persistence failed for a reason other than a duplicate key.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Maps the error to the HTTP status returned to the provider.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            WebhookError::NotConfigured(_) => StatusCode::NOT_FOUND,
            WebhookError::Unauthorized | WebhookError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::InvalidPayload(_) => "INVALID_PAYLOAD",
            WebhookError::NotConfigured(_) => "NOT_CONFIGURED",
            WebhookError::Unauthorized => "UNAUTHORIZED",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn invalid_payload_is_bad_request() {
        let err = WebhookError::InvalidPayload("expected value".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(format!("{}", err), "Invalid payload: expected value");
    }

    #[test]
    fn not_configured_is_not_found() {
        let err = WebhookError::NotConfigured(Provider::Kiwify);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            format!("{}", err),
            "No active webhook endpoint configured for kiwify"
        );
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        assert_eq!(WebhookError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn only_database_errors_are_retryable() {
        assert!(WebhookError::Database("down".into()).is_retryable());
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert!(!WebhookError::InvalidPayload("x".into()).is_retryable());
    }

    #[test]
    fn domain_error_converts_to_database_error() {
        let err: WebhookError = DomainError::new(ErrorCode::DatabaseError, "timeout").into();
        assert!(matches!(err, WebhookError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
