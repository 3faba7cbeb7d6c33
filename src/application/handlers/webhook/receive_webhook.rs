//! ReceiveWebhookHandler - Command handler for inbound provider webhooks.
//!
//! Verifies the request against the provider's active endpoint, stores the
//! raw event exactly once per idempotency key, then hands it to the canonical
//! event processor.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::{Timestamp, WebhookEventId};
use crate::domain::webhook::{
    signature, IdempotencyKey, Provider, VerificationStrategy, WebhookEndpoint, WebhookError,
    WebhookEvent,
};
use crate::ports::{CanonicalEventProcessor, SaveResult, WebhookEndpointRepository, WebhookEventStore};

/// Presence of this header marks a Hotmart request as verified.
pub const HOTMART_TOKEN_HEADER: &str = "x-hotmart-hottok";
pub const KIWIFY_SIGNATURE_HEADER: &str = "x-kiwify-signature";
pub const KIWIFY_SIGNATURE_PARAM: &str = "signature";
pub const SHARED_SECRET_HEADER: &str = "x-webhook-secret";
pub const SHARED_SECRET_PARAM: &str = "secret";

/// Command carrying one raw provider request.
#[derive(Debug, Clone)]
pub struct ReceiveWebhookCommand {
    pub provider: Provider,
    pub body: Vec<u8>,
    /// Request headers with lower-cased names.
    pub headers: BTreeMap<String, String>,
    pub query: HashMap<String, String>,
}

impl ReceiveWebhookCommand {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn raw_headers(&self) -> Value {
        Value::Object(
            self.headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

/// Outcome of a received webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveWebhookResult {
    /// Stored for the first time and handed to the processor.
    Accepted {
        event_id: WebhookEventId,
        processed: bool,
    },
    /// Same idempotency key seen before; nothing was written.
    Duplicate { event_id: Option<WebhookEventId> },
}

pub struct ReceiveWebhookHandler {
    endpoints: Arc<dyn WebhookEndpointRepository>,
    events: Arc<dyn WebhookEventStore>,
    processor: Arc<dyn CanonicalEventProcessor>,
}

impl ReceiveWebhookHandler {
    pub fn new(
        endpoints: Arc<dyn WebhookEndpointRepository>,
        events: Arc<dyn WebhookEventStore>,
        processor: Arc<dyn CanonicalEventProcessor>,
    ) -> Self {
        Self {
            endpoints,
            events,
            processor,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReceiveWebhookCommand,
    ) -> Result<ReceiveWebhookResult, WebhookError> {
        let provider = cmd.provider;

        // 1. Parse body
        let payload: Value = serde_json::from_slice(&cmd.body)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        // 2. Resolve endpoint
        let endpoint = self
            .endpoints
            .find_active(provider)
            .await?
            .ok_or(WebhookError::NotConfigured(provider))?;

        // 3. Verify
        let verified = verify(&endpoint, &cmd)?;

        // 4. Idempotency key
        let key = IdempotencyKey::for_payload(provider, &payload, Timestamp::now());
        let event = WebhookEvent::received(provider, cmd.raw_headers(), payload, key, verified);

        // 5. Store once
        match self.events.insert(&event).await? {
            SaveResult::Inserted => {}
            SaveResult::AlreadyExists => {
                let existing = match self.events.find_by_idempotency_key(&event.idempotency_key).await {
                    Ok(found) => found.map(|e| e.id),
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not load duplicate webhook event");
                        None
                    }
                };
                tracing::info!(
                    provider = %provider,
                    idempotency_key = %event.idempotency_key.as_str(),
                    "Duplicate webhook ignored"
                );
                return Ok(ReceiveWebhookResult::Duplicate { event_id: existing });
            }
        }

        tracing::info!(
            provider = %provider,
            event_id = %event.id,
            verified,
            "Webhook event stored"
        );

        // 6. Canonical processing; the outcome never changes the response
        let processed = match self.processor.process_webhook_event(&event.id).await {
            Ok(output) => {
                if output.success {
                    tracing::info!(
                        event_id = %event.id,
                        canonical_event = output.canonical_event.as_deref().unwrap_or("none"),
                        "Webhook event processed"
                    );
                } else {
                    tracing::warn!(
                        event_id = %event.id,
                        message = output.message.as_deref().unwrap_or(""),
                        "Webhook event not processed"
                    );
                }
                output.success
            }
            Err(e) => {
                tracing::error!(event_id = %event.id, error = %e, "Canonical processing failed");
                false
            }
        };

        Ok(ReceiveWebhookResult::Accepted {
            event_id: event.id,
            processed,
        })
    }
}

/// Applies the provider's verification strategy. Returns the `verified` flag
/// or the rejection.
fn verify(endpoint: &WebhookEndpoint, cmd: &ReceiveWebhookCommand) -> Result<bool, WebhookError> {
    match endpoint.provider.verification() {
        VerificationStrategy::HeaderTokenPresence => Ok(cmd.header(HOTMART_TOKEN_HEADER).is_some()),
        VerificationStrategy::HmacSignature => {
            if !endpoint.require_signature {
                return Ok(true);
            }
            let provided = cmd
                .header(KIWIFY_SIGNATURE_HEADER)
                .or_else(|| cmd.param(KIWIFY_SIGNATURE_PARAM))
                .ok_or(WebhookError::InvalidSignature)?;
            if signature::verify_hex_signature(endpoint.secret_bytes(), &cmd.body, provided) {
                Ok(true)
            } else {
                Err(WebhookError::InvalidSignature)
            }
        }
        VerificationStrategy::SharedSecret => {
            let provided = cmd
                .param(SHARED_SECRET_PARAM)
                .or_else(|| cmd.header(SHARED_SECRET_HEADER))
                .ok_or(WebhookError::Unauthorized)?;
            if signature::secrets_match(endpoint.secret_bytes(), provided.as_bytes()) {
                Ok(true)
            } else {
                Err(WebhookError::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryWebhookEndpoints, InMemoryWebhookEvents, RecordingCanonicalProcessor,
    };
    use crate::ports::RpcError;
    use secrecy::SecretString;
    use serde_json::json;

    const SECRET: &str = "endpoint-secret";

    struct Fixture {
        endpoints: Arc<InMemoryWebhookEndpoints>,
        events: Arc<InMemoryWebhookEvents>,
        processor: Arc<RecordingCanonicalProcessor>,
        handler: ReceiveWebhookHandler,
    }

    async fn fixture(provider: Provider, require_signature: bool) -> Fixture {
        fixture_with(provider, require_signature, RecordingCanonicalProcessor::default()).await
    }

    async fn fixture_with(
        provider: Provider,
        require_signature: bool,
        processor: RecordingCanonicalProcessor,
    ) -> Fixture {
        let endpoints = Arc::new(InMemoryWebhookEndpoints::new());
        endpoints
            .insert(
                WebhookEndpoint::new(
                    provider,
                    "https://api.test/hook",
                    SecretString::new(SECRET.into()),
                    require_signature,
                )
                .unwrap(),
            )
            .await;
        let events = Arc::new(InMemoryWebhookEvents::new());
        let processor = Arc::new(processor);
        let handler = ReceiveWebhookHandler::new(endpoints.clone(), events.clone(), processor.clone());
        Fixture {
            endpoints,
            events,
            processor,
            handler,
        }
    }

    fn command(provider: Provider, body: Value) -> ReceiveWebhookCommand {
        ReceiveWebhookCommand {
            provider,
            body: serde_json::to_vec(&body).unwrap(),
            headers: BTreeMap::new(),
            query: HashMap::new(),
        }
    }

    fn kiwify_body() -> Value {
        json!({"order_id": "K-1", "webhook_event_type": "order_approved"})
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payload and endpoint resolution
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn non_json_body_is_invalid_payload() {
        let f = fixture(Provider::Hotmart, false).await;
        let mut cmd = command(Provider::Hotmart, json!({}));
        cmd.body = b"not json".to_vec();

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
        assert_eq!(f.events.count().await, 0);
    }

    #[tokio::test]
    async fn missing_endpoint_is_not_configured() {
        let f = fixture(Provider::Hotmart, false).await;
        let err = f
            .handler
            .handle(command(Provider::Kiwify, kiwify_body()))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::NotConfigured(Provider::Kiwify)));
    }

    #[tokio::test]
    async fn deactivated_endpoint_is_not_configured() {
        let f = fixture(Provider::Generic, false).await;
        let id = f.endpoints.all().await[0].id;
        f.endpoints.deactivate(&id).await.unwrap();

        let err = f
            .handler
            .handle(command(Provider::Generic, json!({"id": "1"})))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::NotConfigured(_)));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Verification
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn hotmart_is_never_rejected() {
        let f = fixture(Provider::Hotmart, true).await;
        let body = json!({"event": "PURCHASE_APPROVED", "data": {"purchase": {"transaction": "HP1"}}});

        let result = f.handler.handle(command(Provider::Hotmart, body)).await.unwrap();

        assert!(matches!(result, ReceiveWebhookResult::Accepted { .. }));
        assert!(!f.events.all().await[0].verified);
    }

    #[tokio::test]
    async fn hotmart_token_header_marks_verified() {
        let f = fixture(Provider::Hotmart, false).await;
        let mut cmd = command(Provider::Hotmart, json!({"event": "PURCHASE_APPROVED"}));
        cmd.headers.insert(HOTMART_TOKEN_HEADER.into(), "tok".into());

        f.handler.handle(cmd).await.unwrap();
        assert!(f.events.all().await[0].verified);
    }

    #[tokio::test]
    async fn kiwify_valid_signature_is_accepted() {
        let f = fixture(Provider::Kiwify, true).await;
        let mut cmd = command(Provider::Kiwify, kiwify_body());
        let sig = signature::sign_hex(SECRET.as_bytes(), &cmd.body);
        cmd.headers.insert(KIWIFY_SIGNATURE_HEADER.into(), sig);

        let result = f.handler.handle(cmd).await.unwrap();
        assert!(matches!(result, ReceiveWebhookResult::Accepted { processed: true, .. }));
        assert!(f.events.all().await[0].verified);
    }

    #[tokio::test]
    async fn kiwify_signature_may_come_from_query() {
        let f = fixture(Provider::Kiwify, true).await;
        let mut cmd = command(Provider::Kiwify, kiwify_body());
        let sig = signature::sign_hex(SECRET.as_bytes(), &cmd.body);
        cmd.query.insert(KIWIFY_SIGNATURE_PARAM.into(), sig);

        assert!(f.handler.handle(cmd).await.is_ok());
    }

    #[tokio::test]
    async fn kiwify_wrong_signature_is_rejected_without_write() {
        let f = fixture(Provider::Kiwify, true).await;
        let mut cmd = command(Provider::Kiwify, kiwify_body());
        cmd.headers
            .insert(KIWIFY_SIGNATURE_HEADER.into(), signature::sign_hex(b"other", &cmd.body));

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));
        assert_eq!(f.events.count().await, 0);
        assert!(f.processor.processed().is_empty());
    }

    #[tokio::test]
    async fn kiwify_missing_signature_is_rejected_when_required() {
        let f = fixture(Provider::Kiwify, true).await;
        let err = f
            .handler
            .handle(command(Provider::Kiwify, kiwify_body()))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));
    }

    #[tokio::test]
    async fn kiwify_signature_optional_when_not_required() {
        let f = fixture(Provider::Kiwify, false).await;
        let result = f.handler.handle(command(Provider::Kiwify, kiwify_body())).await.unwrap();
        assert!(matches!(result, ReceiveWebhookResult::Accepted { .. }));
        assert!(f.events.all().await[0].verified);
    }

    #[tokio::test]
    async fn generic_secret_in_header_is_accepted() {
        let f = fixture(Provider::Generic, false).await;
        let mut cmd = command(Provider::Generic, json!({"id": "G-1", "event": "sale"}));
        cmd.headers.insert(SHARED_SECRET_HEADER.into(), SECRET.into());

        assert!(f.handler.handle(cmd).await.is_ok());
    }

    #[tokio::test]
    async fn generic_wrong_or_missing_secret_is_unauthorized() {
        let f = fixture(Provider::Generic, false).await;

        let mut wrong = command(Provider::Generic, json!({"id": "G-1"}));
        wrong.query.insert(SHARED_SECRET_PARAM.into(), "nope".into());
        assert!(matches!(
            f.handler.handle(wrong).await.unwrap_err(),
            WebhookError::Unauthorized
        ));

        let missing = command(Provider::Generic, json!({"id": "G-1"}));
        assert!(matches!(
            f.handler.handle(missing).await.unwrap_err(),
            WebhookError::Unauthorized
        ));
        assert_eq!(f.events.count().await, 0);
    }

    #[tokio::test]
    async fn caktor_uses_shared_secret() {
        let f = fixture(Provider::Caktor, false).await;
        let mut cmd = command(Provider::Caktor, json!({"transaction_id": "C-1"}));
        cmd.query.insert(SHARED_SECRET_PARAM.into(), SECRET.into());

        assert!(f.handler.handle(cmd).await.is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Idempotency and processing
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn replay_is_reported_as_duplicate_with_original_id() {
        let f = fixture(Provider::Kiwify, false).await;

        let first = f.handler.handle(command(Provider::Kiwify, kiwify_body())).await.unwrap();
        let second = f.handler.handle(command(Provider::Kiwify, kiwify_body())).await.unwrap();

        let ReceiveWebhookResult::Accepted { event_id, .. } = first else {
            panic!("first delivery should be accepted");
        };
        assert_eq!(
            second,
            ReceiveWebhookResult::Duplicate {
                event_id: Some(event_id)
            }
        );
        assert_eq!(f.events.count().await, 1);
        assert_eq!(f.processor.processed().len(), 1);
    }

    #[tokio::test]
    async fn idempotency_key_follows_provider_fields() {
        let f = fixture(Provider::Kiwify, false).await;
        f.handler.handle(command(Provider::Kiwify, kiwify_body())).await.unwrap();

        let stored = &f.events.all().await[0];
        assert_eq!(stored.idempotency_key.as_str(), "kiwify_K-1_order_approved");
    }

    #[tokio::test]
    async fn headers_are_captured_on_the_event() {
        let f = fixture(Provider::Kiwify, false).await;
        let mut cmd = command(Provider::Kiwify, kiwify_body());
        cmd.headers.insert("user-agent".into(), "kiwify/2".into());

        f.handler.handle(cmd).await.unwrap();
        assert_eq!(f.events.all().await[0].raw_headers["user-agent"], "kiwify/2");
    }

    #[tokio::test]
    async fn processing_failure_still_accepts() {
        let f = fixture_with(
            Provider::Kiwify,
            false,
            RecordingCanonicalProcessor::failing(RpcError::Database("down".into())),
        )
        .await;

        let result = f.handler.handle(command(Provider::Kiwify, kiwify_body())).await.unwrap();
        assert!(matches!(result, ReceiveWebhookResult::Accepted { processed: false, .. }));
        assert_eq!(f.events.count().await, 1);
    }

    #[tokio::test]
    async fn store_failure_is_database_error() {
        let f = fixture(Provider::Kiwify, false).await;
        f.events.fail_writes(true);

        let err = f
            .handler
            .handle(command(Provider::Kiwify, kiwify_body()))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Database(_)));
        assert!(err.is_retryable());
    }
}
