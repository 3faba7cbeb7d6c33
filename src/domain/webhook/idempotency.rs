//! Idempotency keys for inbound provider events.
//!
//! A key is `{provider}_{order_id}_{event_type}`. Both parts are extracted
//! best-effort from the provider payload. When no order identifier exists the
//! current time in milliseconds stands in for it, so such events are never
//! de-duplicated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::foundation::Timestamp;

use super::Provider;

/// Placeholder event type when the payload carries none.
pub const UNKNOWN_EVENT_TYPE: &str = "unknown";

/// Unique key of an external event in the idempotency store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Builds a key from already-extracted parts.
    pub fn from_parts(provider: Provider, order_id: &str, event_type: &str) -> Self {
        Self(format!("{}_{}_{}", provider.as_str(), order_id, event_type))
    }

    /// Wraps a key loaded from storage.
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the key for a provider payload received at `now`.
    pub fn for_payload(provider: Provider, payload: &Value, now: Timestamp) -> Self {
        let order_id = extract_order_id(provider, payload)
            .unwrap_or_else(|| now.as_unix_millis().to_string());
        let event_type =
            extract_event_type(provider, payload).unwrap_or_else(|| UNKNOWN_EVENT_TYPE.to_string());
        Self::from_parts(provider, &order_id, &event_type)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Best-effort external order or transaction id.
pub fn extract_order_id(provider: Provider, payload: &Value) -> Option<String> {
    match provider {
        Provider::Hotmart => scalar_at(payload, &["data", "purchase", "transaction"]),
        Provider::Kiwify => scalar_at(payload, &["order_id"]),
        Provider::Caktor | Provider::Generic => first_scalar(payload, &["id", "transaction_id", "order_id"]),
    }
}

/// Best-effort provider event type.
pub fn extract_event_type(provider: Provider, payload: &Value) -> Option<String> {
    match provider {
        Provider::Hotmart => scalar_at(payload, &["event"]),
        Provider::Kiwify => first_scalar(payload, &["webhook_event_type", "order_status"]),
        Provider::Caktor | Provider::Generic => first_scalar(payload, &["event", "type", "event_type"]),
    }
}

fn first_scalar(payload: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| scalar_at(payload, &[*field]))
}

/// Reads a non-empty string or number at a nested path.
fn scalar_at(payload: &Value, path: &[&str]) -> Option<String> {
    let value = path.iter().try_fold(payload, |node, key| node.get(*key))?;
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
