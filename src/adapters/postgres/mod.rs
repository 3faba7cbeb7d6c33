//! PostgreSQL adapters - Database implementations for store ports.
//!
//! - `PostgresWebhookEventStore` - Raw provider events, unique by idempotency key
//! - `PostgresWebhookEndpointRepository` - Provider endpoint configuration
//! - `PostgresEventBusRepository` - Canonical events awaiting dispatch
//! - `PostgresOutboundSubscriptionRepository` - Subscribers and health counters
//! - `PostgresDeliveryLog` - Delivery attempts
//! - `PostgresTrackingStore` - Pixel configuration and tracking audit
//! - `PostgresChatRestrictionStore` - Chat restrictions and the global block
//! - `PostgresProcedures` - Database functions behind the RPC ports

mod chat_restriction_store;
mod delivery_log;
mod event_bus_repository;
mod outbound_subscription_repository;
mod procedures;
mod tracking_store;
mod webhook_endpoint_repository;
mod webhook_event_store;

pub use chat_restriction_store::PostgresChatRestrictionStore;
pub use delivery_log::PostgresDeliveryLog;
pub use event_bus_repository::PostgresEventBusRepository;
pub use outbound_subscription_repository::PostgresOutboundSubscriptionRepository;
pub use procedures::PostgresProcedures;
pub use tracking_store::PostgresTrackingStore;
pub use webhook_endpoint_repository::PostgresWebhookEndpointRepository;
pub use webhook_event_store::PostgresWebhookEventStore;

/// Reads the `CHECK (column IN (...))` value lists out of the schema so row
/// status enums can be compared against what the database accepts.
#[cfg(test)]
pub(crate) mod schema {
    pub const MIGRATION: &str =
        include_str!("../../../migrations/20260101000001_create_membergate_tables.sql");

    /// Values allowed for `column` in `table`, in declaration order.
    pub fn allowed_values(table: &str, column: &str) -> Vec<String> {
        let start = MIGRATION
            .find(&format!("CREATE TABLE IF NOT EXISTS {} (", table))
            .unwrap_or_else(|| panic!("table {} not in schema", table));
        let body = &MIGRATION[start..];
        let body = &body[..body.find("\n);").unwrap_or(body.len())];

        let marker = format!("CHECK ({} IN (", column);
        let list_start = body
            .find(&marker)
            .unwrap_or_else(|| panic!("{}.{} has no CHECK list", table, column))
            + marker.len();
        let list = &body[list_start..];
        let list = &list[..list.find(')').unwrap_or(list.len())];

        list.split(',')
            .map(|v| v.trim().trim_matches('\'').to_string())
            .collect()
    }
}
