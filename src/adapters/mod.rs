//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - sqlx repositories and stored-procedure calls
//! - `memory` - in-process implementations for development and tests
//! - `realtime` - change feed fed by Postgres notifications
//! - `cache` - TTL cache and the cached role lookup
//! - `outbound` - HTTP delivery of outbound webhooks
//! - `conversions` - ad platform conversions client
//! - `auth` - bearer token validation
//! - `http` - axum routes, middleware and state

pub mod auth;
pub mod cache;
pub mod conversions;
pub mod http;
pub mod memory;
pub mod outbound;
pub mod postgres;
pub mod realtime;
