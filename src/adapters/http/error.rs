//! API error responses.
//!
//! Every failure leaves the service as `{"error": ..., "code": "..."}`.
//! `error` is usually a message; upstream tracking errors carry the
//! platform's JSON body verbatim.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::tracking::TrackingError;
use crate::domain::webhook::WebhookError;

use super::middleware::AuthRejection;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    error: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            error: Value::String(message.into()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_PAYLOAD", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "code": self.code,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        if err.is_retryable() {
            tracing::error!(error = %err, "Webhook processing failed");
        }
        Self::new(err.status_code(), err.code(), err.to_string())
    }
}

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        Self {
            status: err.status_code(),
            code: err.code().to_string(),
            error: err.response_error(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match err.code {
            ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound | ErrorCode::EndpointNotFound | ErrorCode::SubscriptionNotFound => {
                StatusCode::NOT_FOUND
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::UpstreamError | ErrorCode::RpcFailed => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::SerializationError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(code = %err.code, error = %err.message, "Request failed");
        }
        Self::new(status, err.code.to_string(), err.message)
    }
}

impl From<AuthRejection> for ApiError {
    fn from(rejection: AuthRejection) -> Self {
        let (status, code, message) = match rejection {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Authentication required",
            ),
            AuthRejection::Forbidden(message) => (StatusCode::FORBIDDEN, "FORBIDDEN", message),
            AuthRejection::RoleUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ROLE_LOOKUP_FAILED",
                "Could not verify permissions",
            ),
        };
        Self::new(status, code, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::webhook::Provider;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn webhook_errors_keep_their_status_and_code() {
        let (status, body) =
            body_json(WebhookError::NotConfigured(Provider::Hotmart).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_CONFIGURED");
        assert!(body["error"].as_str().unwrap().contains("hotmart"));
    }

    #[tokio::test]
    async fn upstream_tracking_error_passes_body_through() {
        let upstream = json!({"error": {"message": "Invalid parameter", "code": 100}});
        let (status, body) = body_json(
            TrackingError::Upstream {
                status: 400,
                body: upstream.clone(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], upstream);
    }

    #[tokio::test]
    async fn tracking_timeout_is_gateway_timeout() {
        let (status, body) = body_json(TrackingError::Timeout.into()).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["code"], "TIMEOUT");
    }

    #[test]
    fn domain_error_codes_map_to_statuses() {
        let cases = [
            (ErrorCode::ValidationFailed, StatusCode::BAD_REQUEST),
            (ErrorCode::EndpointNotFound, StatusCode::NOT_FOUND),
            (ErrorCode::Forbidden, StatusCode::FORBIDDEN),
            (ErrorCode::RpcFailed, StatusCode::BAD_GATEWAY),
            (ErrorCode::DatabaseError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let err: ApiError = DomainError::new(code, "x").into();
            assert_eq!(err.status(), expected, "{code}");
        }
    }
}
