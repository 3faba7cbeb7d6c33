//! Conversions API client for the ad platform's server-side events endpoint.
//!
//! `POST {base_url}/{api_version}/{pixel_id}/events?access_token=...` with the
//! envelope as JSON body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::tracking::{ConversionsEnvelope, TrackingConfig};
use crate::ports::{ConversionsApi, ConversionsApiError};

pub struct MetaConversionsClient {
    client: Client,
    base_url: String,
    api_version: String,
}

impl MetaConversionsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to create HTTP client: {}", e),
            )
        })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_version: api_version.into(),
        })
    }

    fn events_url(&self, pixel_id: &str) -> String {
        format!(
            "{}/{}/{}/events",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            pixel_id
        )
    }
}

/// Parses a body as JSON, falling back to a JSON string of the raw text.
fn body_value(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn api_error(err: reqwest::Error) -> ConversionsApiError {
    if err.is_timeout() {
        ConversionsApiError::Timeout
    } else {
        ConversionsApiError::Transport(err.to_string())
    }
}

#[async_trait]
impl ConversionsApi for MetaConversionsClient {
    async fn send_events(
        &self,
        config: &TrackingConfig,
        envelope: &ConversionsEnvelope,
    ) -> Result<Value, ConversionsApiError> {
        let response = self
            .client
            .post(self.events_url(&config.pixel_id))
            .query(&[("access_token", config.access_token())])
            .json(envelope)
            .send()
            .await
            .map_err(api_error)?;

        let status = response.status();
        let text = response.text().await.map_err(api_error)?;

        if !status.is_success() {
            return Err(ConversionsApiError::Rejected {
                status: status.as_u16(),
                body: body_value(text),
            });
        }

        Ok(body_value(text))
    }
}
