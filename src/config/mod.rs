//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `MEMBERGATE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use membergate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod chat;
mod database;
mod dispatch;
mod error;
mod server;
mod tracking;

pub use auth::AuthConfig;
pub use chat::ChatConfig;
pub use database::DatabaseConfig;
pub use dispatch::DispatchConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use tracking::ConversionsApiConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Only `database.url` and `auth.jwt_secret` are required; every other value
/// has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub tracking: ConversionsApiConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `MEMBERGATE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `MEMBERGATE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `MEMBERGATE__DISPATCH__POLL_INTERVAL_SECS=30` -> `dispatch.poll_interval_secs = 30`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MEMBERGATE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.dispatch.validate()?;
        self.tracking.validate(&self.server.environment)?;
        self.chat.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
