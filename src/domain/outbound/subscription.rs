//! Third-party subscribers of outbound webhooks.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::{OutboundSubscriptionId, Timestamp, ValidationError};

/// An external system that receives our domain events.
///
/// Health counters are updated after every delivery attempt. Nothing
/// deactivates a subscriber automatically; an admin does that.
#[derive(Debug, Clone)]
pub struct OutboundSubscription {
    pub id: OutboundSubscriptionId,
    pub name: String,
    pub target_url: String,
    pub secret: Option<SecretString>,
    pub active: bool,
    pub failures_count: i32,
    pub last_delivery_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl OutboundSubscription {
    /// Creates an active subscriber with clean health counters.
    pub fn new(
        name: impl Into<String>,
        target_url: impl Into<String>,
        secret: Option<SecretString>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let target_url = target_url.into();

        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if !(target_url.starts_with("https://") || target_url.starts_with("http://")) {
            return Err(ValidationError::invalid_format(
                "target_url",
                "must be an http(s) URL",
            ));
        }

        // An empty secret means unsigned deliveries.
        let secret = secret.filter(|s| !s.expose_secret().is_empty());

        Ok(Self {
            id: OutboundSubscriptionId::new(),
            name,
            target_url,
            secret,
            active: true,
            failures_count: 0,
            last_delivery_at: None,
            created_at: Timestamp::now(),
        })
    }

    /// Secret bytes used to sign deliveries, if the subscriber has one.
    pub fn signing_secret(&self) -> Option<&[u8]> {
        self.secret.as_ref().map(|s| s.expose_secret().as_bytes())
    }

    /// Applies a successful delivery to the health counters.
    pub fn record_success(&mut self, at: Timestamp) {
        self.failures_count = 0;
        self.last_delivery_at = Some(at);
    }

    /// Applies a failed delivery to the health counters.
    pub fn record_failure(&mut self) {
        self.failures_count = self.failures_count.saturating_add(1);
    }

    pub fn summary(&self) -> OutboundSubscriptionSummary {
        OutboundSubscriptionSummary {
            id: self.id,
            name: self.name.clone(),
            target_url: self.target_url.clone(),
            signed: self.secret.is_some(),
            active: self.active,
            failures_count: self.failures_count,
            last_delivery_at: self.last_delivery_at,
            created_at: self.created_at,
        }
    }
}

/// Serializable subscriber view without its secret.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutboundSubscriptionSummary {
    pub id: OutboundSubscriptionId,
    pub name: String,
    pub target_url: String,
    pub signed: bool,
    pub active: bool,
    pub failures_count: i32,
    pub last_delivery_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber() -> OutboundSubscription {
        OutboundSubscription::new("crm", "https://crm.test/hooks", None).unwrap()
    }

    #[test]
    fn new_subscription_is_active_and_healthy() {
        let sub = subscriber();
        assert!(sub.active);
        assert_eq!(sub.failures_count, 0);
        assert!(sub.signing_secret().is_none());
    }

    #[test]
    fn non_http_target_is_rejected() {
        let result = OutboundSubscription::new("crm", "ftp://crm.test", None);
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn empty_secret_means_unsigned() {
        let sub = OutboundSubscription::new(
            "crm",
            "https://crm.test",
            Some(SecretString::new(String::new())),
        )
        .unwrap();
        assert!(sub.signing_secret().is_none());
    }

    #[test]
    fn failure_increments_by_exactly_one() {
        let mut sub = subscriber();
        sub.record_failure();
        sub.record_failure();
        assert_eq!(sub.failures_count, 2);
    }

    #[test]
    fn success_resets_failures_and_stamps_delivery() {
        let mut sub = subscriber();
        sub.record_failure();
        let now = Timestamp::now();
        sub.record_success(now);
        assert_eq!(sub.failures_count, 0);
        assert_eq!(sub.last_delivery_at, Some(now));
    }
}
