//! Domain events queued for outbound dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::foundation::{BusEventId, Timestamp, UserId, ValidationError};

/// Dispatch state of a bus entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusEventStatus {
    Pending,
    Dispatched,
    Failed,
}

impl BusEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusEventStatus::Pending => "pending",
            BusEventStatus::Dispatched => "dispatched",
            BusEventStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for BusEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusEventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BusEventStatus::Pending),
            "dispatched" => Ok(BusEventStatus::Dispatched),
            "failed" => Ok(BusEventStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown bus event status '{}'", other),
            )),
        }
    }
}

/// A canonical domain event produced by the canonical event processor.
///
/// `subscription_id` refers to the member's plan subscription, not to an
/// outbound subscriber.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBusEntry {
    pub id: BusEventId,
    pub event_type: String,
    pub user_id: Option<UserId>,
    pub subscription_id: Option<Uuid>,
    pub data: Value,
    pub status: BusEventStatus,
    pub retry_count: i32,
    pub created_at: Timestamp,
    pub dispatched_at: Option<Timestamp>,
}

impl EventBusEntry {
    /// Creates a pending entry.
    pub fn pending(
        event_type: impl Into<String>,
        user_id: Option<UserId>,
        subscription_id: Option<Uuid>,
        data: Value,
    ) -> Self {
        Self {
            id: BusEventId::new(),
            event_type: event_type.into(),
            user_id,
            subscription_id,
            data,
            status: BusEventStatus::Pending,
            retry_count: 0,
            created_at: Timestamp::now(),
            dispatched_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == BusEventStatus::Pending
    }

    /// Transitions the entry to dispatched.
    pub fn mark_dispatched(&mut self, at: Timestamp) {
        self.status = BusEventStatus::Dispatched;
        self.dispatched_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pending_entry_has_no_dispatch_time() {
        let entry = EventBusEntry::pending("payment_succeeded", None, None, json!({}));
        assert!(entry.is_pending());
        assert_eq!(entry.retry_count, 0);
        assert!(entry.dispatched_at.is_none());
    }

    #[test]
    fn mark_dispatched_sets_status_and_time() {
        let mut entry = EventBusEntry::pending("payment_succeeded", None, None, json!({}));
        let now = Timestamp::now();
        entry.mark_dispatched(now);
        assert_eq!(entry.status, BusEventStatus::Dispatched);
        assert_eq!(entry.dispatched_at, Some(now));
    }

    #[test]
    fn status_parses_from_storage() {
        assert_eq!("dispatched".parse::<BusEventStatus>().unwrap(), BusEventStatus::Dispatched);
        assert!("in_flight".parse::<BusEventStatus>().is_err());
    }
}
