//! Outbound delivery attempts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    BusEventId, DeliveryId, OutboundSubscriptionId, Timestamp, ValidationError,
};

/// Maximum number of characters of a response body kept on a delivery row.
pub const MAX_RESPONSE_BODY_CHARS: usize = 1000;

/// Every delivery row records a single attempt.
pub const FIRST_ATTEMPT: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
    Retry,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Retry => "retry",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "delivered" | "success" => Ok(DeliveryStatus::Delivered),
            "failed" => Ok(DeliveryStatus::Failed),
            "retry" => Ok(DeliveryStatus::Retry),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown delivery status '{}'", other),
            )),
        }
    }
}

/// One (event, subscriber) delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundDelivery {
    pub id: DeliveryId,
    pub event_id: BusEventId,
    pub target_id: OutboundSubscriptionId,
    pub attempt: i32,
    pub status: DeliveryStatus,
    pub response_code: Option<i32>,
    pub response_body: Option<String>,
    pub next_retry_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl OutboundDelivery {
    /// A delivery the subscriber acknowledged with a 2xx.
    pub fn delivered(
        event_id: BusEventId,
        target_id: OutboundSubscriptionId,
        response_code: i32,
        response_body: &str,
    ) -> Self {
        Self {
            id: DeliveryId::new(),
            event_id,
            target_id,
            attempt: FIRST_ATTEMPT,
            status: DeliveryStatus::Delivered,
            response_code: Some(response_code),
            response_body: Some(truncate_body(response_body)),
            next_retry_at: None,
            created_at: Timestamp::now(),
        }
    }

    /// A delivery that got a non-2xx response or never got a response.
    ///
    /// `next_retry_at` is only a marker for a future retry executor.
    pub fn failed(
        event_id: BusEventId,
        target_id: OutboundSubscriptionId,
        response_code: Option<i32>,
        detail: &str,
        next_retry_at: Timestamp,
    ) -> Self {
        Self {
            id: DeliveryId::new(),
            event_id,
            target_id,
            attempt: FIRST_ATTEMPT,
            status: DeliveryStatus::Failed,
            response_code,
            response_body: Some(truncate_body(detail)),
            next_retry_at: Some(next_retry_at),
            created_at: Timestamp::now(),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

/// Truncates to at most `MAX_RESPONSE_BODY_CHARS` characters on a char boundary.
pub fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_RESPONSE_BODY_CHARS).collect()
}
