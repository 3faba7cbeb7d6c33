//! Wire format of outbound deliveries.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::foundation::{BusEventId, DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::webhook::signature;

use super::EventBusEntry;

/// Body POSTed to every subscriber.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryEnvelope {
    pub event_id: BusEventId,
    pub event_type: String,
    pub user_id: Option<UserId>,
    pub subscription_id: Option<Uuid>,
    pub data: Value,
    pub timestamp: String,
}

impl DeliveryEnvelope {
    pub fn from_entry(entry: &EventBusEntry, sent_at: Timestamp) -> Self {
        Self {
            event_id: entry.id,
            event_type: entry.event_type.clone(),
            user_id: entry.user_id,
            subscription_id: entry.subscription_id,
            data: entry.data.clone(),
            timestamp: sent_at.to_rfc3339(),
        }
    }

    /// Serializes the envelope. The signature is computed over these exact bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self).map_err(|e| {
            DomainError::new(
                ErrorCode::SerializationError,
                format!("Failed to serialize delivery envelope: {}", e),
            )
        })
    }
}

/// A ready-to-send request for one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDelivery {
    pub body: Vec<u8>,
    /// `sha256=<hex>` when the subscriber has a secret.
    pub signature: Option<String>,
}

impl SignedDelivery {
    pub fn new(body: Vec<u8>, secret: Option<&[u8]>) -> Self {
        let signature = secret.map(|secret| signature::signature_header_value(secret, &body));
        Self { body, signature }
    }
}
