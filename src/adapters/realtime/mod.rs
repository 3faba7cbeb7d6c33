//! Realtime change notifications for chat restriction re-evaluation.

mod change_feed;
mod pg_listener;
mod sweeper;

pub use change_feed::{
    decode_notification, ChangeFeed, ChangeTopic, ChangeType, RowChange, CHAT_SETTINGS_TABLE,
    PROFILES_TABLE, USER_RESTRICTIONS_TABLE,
};
pub use pg_listener::{PgChangeListener, CHANGE_CHANNEL};
pub use sweeper::RealtimeSweeper;
