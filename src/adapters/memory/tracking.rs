//! In-memory pixel configuration and tracking audit log.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::tracking::{TrackingConfig, TrackingEvent};
use crate::ports::{TrackingConfigReader, TrackingEventLog};

#[derive(Debug, Default)]
pub struct InMemoryTrackingStore {
    configs: RwLock<Vec<TrackingConfig>>,
    events: RwLock<Vec<TrackingEvent>>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_config(&self, config: TrackingConfig) {
        self.configs.write().await.push(config);
    }

    pub async fn events(&self) -> Vec<TrackingEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl TrackingConfigReader for InMemoryTrackingStore {
    async fn active_config(&self) -> Result<Option<TrackingConfig>, DomainError> {
        Ok(self
            .configs
            .read()
            .await
            .iter()
            .filter(|c| c.is_usable())
            .max_by_key(|c| c.created_at)
            .cloned())
    }
}

#[async_trait]
impl TrackingEventLog for InMemoryTrackingStore {
    async fn record(&self, event: &TrackingEvent) -> Result<(), DomainError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
