//! reqwest implementation of WebhookSender.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::outbound::{SignedDelivery, MAX_RESPONSE_BODY_CHARS};
use crate::ports::{SendError, SenderResponse, WebhookSender};

/// Header carrying `sha256=<hex>` when the subscriber has a secret.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Most bytes of a subscriber response that are read. Enough for the stored
/// prefix even when every character is four bytes long.
pub const MAX_RESPONSE_BODY_BYTES: usize = MAX_RESPONSE_BODY_CHARS * 4;

/// POSTs signed deliveries with a bounded timeout.
pub struct HttpWebhookSender {
    client: Client,
}

impl HttpWebhookSender {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { client })
    }
}

/// Reads at most [`MAX_RESPONSE_BODY_BYTES`] of the body, then drops the rest.
async fn read_body_prefix(mut response: reqwest::Response) -> Result<String, reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = MAX_RESPONSE_BODY_BYTES - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn send_error(err: reqwest::Error) -> SendError {
    if err.is_timeout() {
        SendError::Timeout
    } else {
        SendError::Transport(err.to_string())
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, url: &str, delivery: &SignedDelivery) -> Result<SenderResponse, SendError> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(delivery.body.clone());

        if let Some(signature) = &delivery.signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send().await.map_err(send_error)?;
        let status = response.status().as_u16();
        let body = match read_body_prefix(response).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Could not read subscriber response body");
                String::new()
            }
        };

        Ok(SenderResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Vec<(HeaderMap, Bytes)>>>;

    async fn start_subscriber(status: StatusCode, delay: Duration) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let app = Router::new().route(
            "/hook",
            post(move |headers: HeaderMap, body: Bytes| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push((headers, body));
                    tokio::time::sleep(delay).await;
                    (status, "subscriber says hi")
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/hook", addr), captured)
    }

    fn sender(timeout: Duration) -> HttpWebhookSender {
        HttpWebhookSender::new(timeout, "membergate-webhooks/1.0").unwrap()
    }

    #[tokio::test]
    async fn signed_delivery_carries_headers_and_body() {
        let (url, captured) = start_subscriber(StatusCode::OK, Duration::ZERO).await;
        let delivery = SignedDelivery::new(br#"{"a":1}"#.to_vec(), Some(b"secret"));

        let response = sender(Duration::from_secs(5)).send(&url, &delivery).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "subscriber says hi");

        let requests = captured.lock().unwrap();
        let (headers, body) = &requests[0];
        assert_eq!(body.as_ref(), br#"{"a":1}"#);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["user-agent"], "membergate-webhooks/1.0");
        assert_eq!(
            headers["x-webhook-signature"].to_str().unwrap(),
            delivery.signature.as_deref().unwrap()
        );
    }

    #[tokio::test]
    async fn unsigned_delivery_omits_signature_header() {
        let (url, captured) = start_subscriber(StatusCode::OK, Duration::ZERO).await;
        let delivery = SignedDelivery::new(b"{}".to_vec(), None);

        sender(Duration::from_secs(5)).send(&url, &delivery).await.unwrap();

        let requests = captured.lock().unwrap();
        assert!(requests[0].0.get("x-webhook-signature").is_none());
    }

    #[tokio::test]
    async fn non_2xx_is_a_response_not_an_error() {
        let (url, _) = start_subscriber(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO).await;
        let delivery = SignedDelivery::new(b"{}".to_vec(), None);

        let response = sender(Duration::from_secs(5)).send(&url, &delivery).await.unwrap();
        assert_eq!(response.status, 500);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn slow_subscriber_times_out() {
        let (url, _) = start_subscriber(StatusCode::OK, Duration::from_secs(2)).await;
        let delivery = SignedDelivery::new(b"{}".to_vec(), None);

        let err = sender(Duration::from_millis(100))
            .send(&url, &delivery)
            .await
            .unwrap_err();
        assert_eq!(err, SendError::Timeout);
    }

    #[tokio::test]
    async fn unreachable_subscriber_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let delivery = SignedDelivery::new(b"{}".to_vec(), None);
        let err = sender(Duration::from_secs(2))
            .send(&format!("http://{}/hook", addr), &delivery)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Transport(_)));
    }

    #[tokio::test]
    async fn large_response_body_is_read_only_up_to_the_cap() {
        let huge = "x".repeat(MAX_RESPONSE_BODY_BYTES * 64);
        let app = Router::new().route("/hook", post(move || async move { huge }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let delivery = SignedDelivery::new(b"{}".to_vec(), None);
        let response = sender(Duration::from_secs(5))
            .send(&format!("http://{}/hook", addr), &delivery)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), MAX_RESPONSE_BODY_BYTES);
        assert!(response.body.chars().all(|c| c == 'x'));
    }

    #[tokio::test]
    async fn multibyte_body_keeps_the_stored_prefix_intact() {
        let body = "é".repeat(MAX_RESPONSE_BODY_CHARS * 2);
        let app = Router::new().route("/hook", post(move || async move { body }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let delivery = SignedDelivery::new(b"{}".to_vec(), None);
        let response = sender(Duration::from_secs(5))
            .send(&format!("http://{}/hook", addr), &delivery)
            .await
            .unwrap();

        let prefix: String = response.body.chars().take(MAX_RESPONSE_BODY_CHARS).collect();
        assert_eq!(prefix, "é".repeat(MAX_RESPONSE_BODY_CHARS));
    }
}
