//! EventBusRepository port - the queue of canonical events awaiting dispatch.
//!
//! Entries are written by the canonical event processor. The dispatcher reads
//! pending entries and marks them dispatched. There is no claim step between
//! the two, so overlapping dispatcher runs may both see the same entry.

use async_trait::async_trait;

use crate::domain::foundation::{BusEventId, DomainError, Timestamp};
use crate::domain::outbound::EventBusEntry;

#[async_trait]
pub trait EventBusRepository: Send + Sync {
    /// Returns up to `limit` pending entries, oldest first.
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<EventBusEntry>, DomainError>;

    /// Marks an entry dispatched.
    async fn mark_dispatched(&self, id: &BusEventId, at: Timestamp) -> Result<(), DomainError>;
}
