//! WebhookEventStore port - the idempotency store for inbound provider events.
//!
//! Providers redeliver the same event on timeouts, 5xx responses and manual
//! replays. The store's UNIQUE constraint on the idempotency key is the only
//! de-duplication mechanism: receivers do not check before inserting, they
//! insert and interpret the result.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{IdempotencyKey, WebhookEvent};

/// Result of attempting to store a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Row was inserted (first time seeing this event).
    Inserted,
    /// A row with the same idempotency key already exists.
    AlreadyExists,
}

/// Port for storing raw inbound webhook events.
#[async_trait]
pub trait WebhookEventStore: Send + Sync {
    /// Inserts a received event.
    ///
    /// A unique-key conflict must be reported as `SaveResult::AlreadyExists`,
    /// never as an error. Any other failure is a `DatabaseError`.
    async fn insert(&self, event: &WebhookEvent) -> Result<SaveResult, DomainError>;

    /// Finds the stored event for a key, if any.
    async fn find_by_idempotency_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<WebhookEvent>, DomainError>;
}
