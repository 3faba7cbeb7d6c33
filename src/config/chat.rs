//! Chat restriction configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Quiet period before a burst of change notifications is re-evaluated
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long a looked-up role is trusted
    #[serde(default = "default_role_cache_ttl")]
    pub role_cache_ttl_secs: u64,

    /// How often abandoned feed channels and expired roles are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl ChatConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn role_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.role_cache_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.debounce_ms > 10_000 {
            return Err(ValidationError::InvalidValue("chat.debounce_ms"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidValue("chat.sweep_interval_secs"));
        }
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            role_cache_ttl_secs: default_role_cache_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_role_cache_ttl() -> u64 {
    60
}

fn default_sweep_interval() -> u64 {
    60
}
