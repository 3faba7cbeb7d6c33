//! Application handlers, grouped by area.
//!
//! - `webhook` - inbound provider webhooks and endpoint administration
//! - `outbound` - event bus dispatch to third-party subscribers
//! - `tracking` - server-side conversion forwarding
//! - `chat` - chat restriction checks, live watchers and moderation
//! - `admin` - stored-procedure backed administrative and scheduled jobs

pub mod admin;
pub mod chat;
pub mod outbound;
pub mod tracking;
pub mod webhook;
