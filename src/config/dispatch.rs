//! Outbound webhook dispatch configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_BATCH_SIZE: u32 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Pending bus events taken per pass
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Timeout of each subscriber request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Delay recorded as `next_retry_at` on failed deliveries
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Run passes in-process on this interval. Unset leaves dispatch to the job endpoint.
    pub poll_interval_secs: Option<u64>,
}

impl DispatchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ValidationError::InvalidBatchSize(MAX_BATCH_SIZE));
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.poll_interval_secs == Some(0) {
            return Err(ValidationError::InvalidValue("dispatch.poll_interval_secs"));
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout(),
            retry_delay_secs: default_retry_delay(),
            user_agent: default_user_agent(),
            poll_interval_secs: None,
        }
    }
}

fn default_batch_size() -> u32 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!("membergate-webhooks/{}", env!("CARGO_PKG_VERSION"))
}
