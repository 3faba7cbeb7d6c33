//! WebhookSender port - HTTP client for outbound deliveries.
//!
//! The dispatcher never sees HTTP types; it hands over a signed body and gets
//! back either a status/body pair or a transport failure.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::outbound::SignedDelivery;

/// Response from a subscriber, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderResponse {
    pub status: u16,
    pub body: String,
}

impl SenderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure before a response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// POSTs the delivery to `url`.
    ///
    /// Non-2xx responses are returned as `Ok`; only failures to obtain a
    /// response are errors.
    async fn send(&self, url: &str, delivery: &SignedDelivery) -> Result<SenderResponse, SendError>;
}
