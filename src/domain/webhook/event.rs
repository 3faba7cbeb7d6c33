//! Stored inbound webhook events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError, WebhookEventId};

use super::{IdempotencyKey, Provider};

/// Lifecycle of a stored event.
///
/// Receivers only ever write `Received`; the canonical event processor moves
/// events to `Processed`, `Failed` or `Discarded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventStatus {
    Received,
    Processed,
    Failed,
    Discarded,
}

impl WebhookEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventStatus::Received => "received",
            WebhookEventStatus::Processed => "processed",
            WebhookEventStatus::Failed => "failed",
            WebhookEventStatus::Discarded => "discarded",
        }
    }
}

impl fmt::Display for WebhookEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(WebhookEventStatus::Received),
            "processed" => Ok(WebhookEventStatus::Processed),
            "failed" => Ok(WebhookEventStatus::Failed),
            "discarded" => Ok(WebhookEventStatus::Discarded),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown webhook event status '{}'", other),
            )),
        }
    }
}

/// A raw provider event as persisted in the idempotency store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    pub id: WebhookEventId,
    pub provider: Provider,
    pub raw_headers: Value,
    pub raw_payload: Value,
    pub idempotency_key: IdempotencyKey,
    pub verified: bool,
    pub status: WebhookEventStatus,
    pub canonical_event: Option<String>,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl WebhookEvent {
    /// Creates a freshly received event.
    pub fn received(
        provider: Provider,
        raw_headers: Value,
        raw_payload: Value,
        idempotency_key: IdempotencyKey,
        verified: bool,
    ) -> Self {
        Self {
            id: WebhookEventId::new(),
            provider,
            raw_headers,
            raw_payload,
            idempotency_key,
            verified,
            status: WebhookEventStatus::Received,
            canonical_event: None,
            processed_at: None,
            created_at: Timestamp::now(),
        }
    }
}
