//! Chat access gating.

mod restriction;

pub use restriction::{
    normalize_reason, ChatRestriction, GlobalChatBlock, RestrictionSource, UserChatRestriction,
    GLOBAL_CHAT_BLOCK_KEY, MAX_REASON_CHARS, VERIFICATION_ERROR_REASON,
};
