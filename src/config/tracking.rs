//! Conversions API client configuration
//!
//! Pixel ids and access tokens live in the database; this only covers how the
//! API is reached.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionsApiConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ConversionsApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("tracking.api_base_url"));
        }
        if *environment == Environment::Production && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::MustBeHttps("tracking.api_base_url"));
        }
        if self.api_version.trim().is_empty() {
            return Err(ValidationError::MissingRequired("TRACKING__API_VERSION"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ConversionsApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

fn default_timeout() -> u64 {
    10
}
