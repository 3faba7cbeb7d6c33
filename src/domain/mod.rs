//! Domain layer containing business rules and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, errors, auth)
//! - `webhook` - Inbound provider webhooks and idempotency
//! - `outbound` - Event bus entries, subscribers and delivery records
//! - `tracking` - Server-side conversion events
//! - `chat` - Chat restriction rules
//! - `billing` - Membership plans

pub mod billing;
pub mod chat;
pub mod foundation;
pub mod outbound;
pub mod tracking;
pub mod webhook;
