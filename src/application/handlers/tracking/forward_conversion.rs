//! ForwardConversionHandler - Forwards a conversion to the ad platform.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::foundation::Timestamp;
use crate::domain::tracking::{ConversionRequest, ConversionsEnvelope, TrackingError, TrackingEvent};
use crate::ports::{ConversionsApi, ConversionsApiError, TrackingConfigReader, TrackingEventLog};

pub struct ForwardConversionHandler {
    configs: Arc<dyn TrackingConfigReader>,
    audit: Arc<dyn TrackingEventLog>,
    api: Arc<dyn ConversionsApi>,
}

impl ForwardConversionHandler {
    pub fn new(
        configs: Arc<dyn TrackingConfigReader>,
        audit: Arc<dyn TrackingEventLog>,
        api: Arc<dyn ConversionsApi>,
    ) -> Self {
        Self {
            configs,
            audit,
            api,
        }
    }

    /// Sends the conversion and returns the upstream JSON response.
    ///
    /// Every attempt that reaches the platform leaves one audit row.
    pub async fn handle(&self, request: ConversionRequest) -> Result<Value, TrackingError> {
        let conversion = request.validate()?;

        let config = self
            .configs
            .active_config()
            .await?
            .ok_or(TrackingError::NotConfigured)?;

        let envelope =
            ConversionsEnvelope::build(&conversion, config.test_event_code.clone(), Timestamp::now());
        let payload = serde_json::to_value(&envelope).unwrap_or(Value::Null);

        let outcome = self.api.send_events(&config, &envelope).await;

        let (audit_row, result) = match outcome {
            Ok(response) => (
                TrackingEvent::succeeded(
                    &conversion.event_name,
                    &conversion.event_id,
                    payload,
                    response.clone(),
                ),
                Ok(response),
            ),
            Err(ConversionsApiError::Rejected { status, body }) => (
                TrackingEvent::failed(
                    &conversion.event_name,
                    &conversion.event_id,
                    payload,
                    body.to_string(),
                ),
                Err(TrackingError::Upstream { status, body }),
            ),
            Err(ConversionsApiError::Timeout) => (
                TrackingEvent::failed(
                    &conversion.event_name,
                    &conversion.event_id,
                    payload,
                    "request timed out",
                ),
                Err(TrackingError::Timeout),
            ),
            Err(ConversionsApiError::Transport(message)) => (
                TrackingEvent::failed(
                    &conversion.event_name,
                    &conversion.event_id,
                    payload,
                    message.clone(),
                ),
                Err(TrackingError::Transport(message)),
            ),
        };

        if let Err(e) = self.audit.record(&audit_row).await {
            tracing::error!(event_id = %conversion.event_id, error = %e, "Failed to write tracking audit row");
        }

        match &result {
            Ok(_) => tracing::info!(
                event_name = %conversion.event_name,
                event_id = %conversion.event_id,
                "Conversion forwarded"
            ),
            Err(e) => tracing::warn!(
                event_name = %conversion.event_name,
                event_id = %conversion.event_id,
                error = %e,
                "Conversion rejected"
            ),
        }

        result
    }
}
