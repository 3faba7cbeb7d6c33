//! Conversion tracking ports.
//!
//! - `TrackingConfigReader` - selects the pixel configuration in use
//! - `TrackingEventLog` - immutable audit of every forwarding attempt
//! - `ConversionsApi` - the ad platform's server-side events endpoint

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::domain::tracking::{ConversionsEnvelope, TrackingConfig, TrackingEvent};

#[async_trait]
pub trait TrackingConfigReader: Send + Sync {
    /// The most recently created row that is active with server-side sending enabled.
    async fn active_config(&self) -> Result<Option<TrackingConfig>, DomainError>;
}

#[async_trait]
pub trait TrackingEventLog: Send + Sync {
    async fn record(&self, event: &TrackingEvent) -> Result<(), DomainError>;
}

/// Failure reported by the conversions API client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionsApiError {
    /// Non-2xx response. The body is kept verbatim (JSON if it parses, else a string).
    #[error("conversions API rejected the event with status {status}")]
    Rejected { status: u16, body: Value },

    #[error("conversions API timed out")]
    Timeout,

    #[error("conversions API transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ConversionsApi: Send + Sync {
    /// Sends the envelope for `config`'s pixel and returns the upstream JSON.
    async fn send_events(
        &self,
        config: &TrackingConfig,
        envelope: &ConversionsEnvelope,
    ) -> Result<Value, ConversionsApiError>;
}
