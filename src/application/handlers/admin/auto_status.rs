//! ProcessAutoStatusHandler - Job that applies due status schedules.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::ports::AutoStatusScheduler;

pub struct ProcessAutoStatusHandler {
    scheduler: Arc<dyn AutoStatusScheduler>,
}

impl ProcessAutoStatusHandler {
    pub fn new(scheduler: Arc<dyn AutoStatusScheduler>) -> Self {
        Self { scheduler }
    }

    /// Returns the number of rows the schedules updated.
    pub async fn handle(&self) -> Result<i64, DomainError> {
        let updated = self.scheduler.process_auto_status_schedules().await?;
        if updated > 0 {
            tracing::info!(updated, "Auto-status schedules applied");
        }
        Ok(updated)
    }
}
