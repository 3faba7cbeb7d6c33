//! Chat access handlers.
//!
//! - One-off restriction checks
//! - Live re-evaluation driven by the change feed
//! - Moderation by staff

mod moderate_chat;
mod resolve_restriction;
mod restriction_watcher;

pub use moderate_chat::{ModerateChatHandler, RestrictUserCommand, SetGlobalBlockCommand};
pub use resolve_restriction::ResolveChatRestrictionHandler;
pub use restriction_watcher::{RestrictionWatcher, RestrictionWatchers};
