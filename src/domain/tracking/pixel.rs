//! Pixel configuration and the per-send audit log.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::{Timestamp, TrackingConfigId};

/// Ad-platform pixel credentials. The most recent active row with
/// server-side sending enabled is the one in use.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    pub id: TrackingConfigId,
    pub pixel_id: String,
    pub access_token: SecretString,
    pub test_event_code: Option<String>,
    pub server_side_enabled: bool,
    pub active: bool,
    pub created_at: Timestamp,
}

impl TrackingConfig {
    pub fn new(pixel_id: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            id: TrackingConfigId::new(),
            pixel_id: pixel_id.into(),
            access_token,
            test_event_code: None,
            server_side_enabled: true,
            active: true,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_test_event_code(mut self, code: impl Into<String>) -> Self {
        self.test_event_code = Some(code.into());
        self
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Whether this row may be used to forward events.
    pub fn is_usable(&self) -> bool {
        self.active && self.server_side_enabled
    }
}

/// Immutable audit row for one forwarding attempt.
///
/// `payload` is the envelope exactly as sent, so it carries hashed
/// identifiers only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrackingEvent {
    pub id: uuid::Uuid,
    pub event_name: String,
    pub event_id: String,
    pub payload: Value,
    pub success: bool,
    pub response: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
}

impl TrackingEvent {
    pub fn succeeded(event_name: &str, event_id: &str, payload: Value, response: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            event_name: event_name.to_string(),
            event_id: event_id.to_string(),
            payload,
            success: true,
            response: Some(response),
            error_message: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn failed(
        event_name: &str,
        event_id: &str,
        payload: Value,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            event_name: event_name.to_string(),
            event_id: event_id.to_string(),
            payload,
            success: false,
            response: None,
            error_message: Some(error_message.into()),
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_config_is_usable() {
        let config = TrackingConfig::new("123", SecretString::new("tok".into()));
        assert!(config.is_usable());
        assert_eq!(config.access_token(), "tok");
    }

    #[test]
    fn disabled_server_side_is_not_usable() {
        let mut config = TrackingConfig::new("123", SecretString::new("tok".into()));
        config.server_side_enabled = false;
        assert!(!config.is_usable());
    }

    #[test]
    fn failed_event_records_error_and_no_response() {
        let event = TrackingEvent::failed("Purchase", "e1", json!({}), "{\"error\":{}}");
        assert!(!event.success);
        assert!(event.response.is_none());
        assert_eq!(event.error_message.as_deref(), Some("{\"error\":{}}"));
    }
}
