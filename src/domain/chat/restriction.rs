//! Chat restrictions and the rule that combines them.
//!
//! A user's chat access is derived on every check, never stored:
//!
//! 1. Admins and moderators are always allowed.
//! 2. An unexpired global block blocks everyone else.
//! 3. The most recent unexpired personal restriction blocks the user.
//! 4. Otherwise the user is allowed.
//!
//! Any lookup failure blocks, see [`ChatRestriction::verification_failed`].

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RestrictionId, Timestamp, UserId, UserRole, ValidationError};

/// Reason reported when the restriction state could not be determined.
pub const VERIFICATION_ERROR_REASON: &str = "error verifying permissions";

/// Key of the global block in the chat settings table.
pub const GLOBAL_CHAT_BLOCK_KEY: &str = "global_chat_block";

/// Longest moderator-supplied reason, in characters.
pub const MAX_REASON_CHARS: usize = 500;

/// Trims a moderator reason. Blank reasons become `None`.
pub fn normalize_reason(reason: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(reason) = reason else {
        return Ok(None);
    };
    let reason = reason.trim();
    if reason.is_empty() {
        return Ok(None);
    }
    if reason.chars().count() > MAX_REASON_CHARS {
        return Err(ValidationError::invalid_format(
            "reason",
            format!("must be at most {} characters", MAX_REASON_CHARS),
        ));
    }
    Ok(Some(reason.to_string()))
}

/// A per-user block placed by a moderator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserChatRestriction {
    pub id: RestrictionId,
    pub user_id: UserId,
    pub reason: Option<String>,
    pub blocked_until: Timestamp,
    pub created_by: Option<UserId>,
    pub created_at: Timestamp,
}

impl UserChatRestriction {
    pub fn new(
        user_id: UserId,
        reason: Option<String>,
        blocked_until: Timestamp,
        created_by: Option<UserId>,
    ) -> Result<Self, ValidationError> {
        let now = Timestamp::now();
        if !blocked_until.is_after(&now) {
            return Err(ValidationError::invalid_format(
                "blocked_until",
                "must be in the future",
            ));
        }
        Ok(Self {
            id: RestrictionId::new(),
            user_id,
            reason: normalize_reason(reason)?,
            blocked_until,
            created_by,
            created_at: now,
        })
    }

    pub fn is_active_at(&self, now: &Timestamp) -> bool {
        self.blocked_until.is_after(now)
    }
}

/// The platform-wide chat block setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalChatBlock {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub blocked_until: Option<Timestamp>,
}

impl GlobalChatBlock {
    /// A block ending at `blocked_until`, which must be in the future.
    pub fn new(reason: Option<String>, blocked_until: Timestamp) -> Result<Self, ValidationError> {
        if !blocked_until.is_after(&Timestamp::now()) {
            return Err(ValidationError::invalid_format(
                "blocked_until",
                "must be in the future",
            ));
        }
        Ok(Self {
            reason: normalize_reason(reason)?,
            blocked_until: Some(blocked_until),
        })
    }

    pub fn is_active_at(&self, now: &Timestamp) -> bool {
        self.blocked_until.map(|until| until.is_after(now)).unwrap_or(false)
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionSource {
    None,
    Role,
    Global,
    User,
    Error,
}

/// Outcome of a chat access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRestriction {
    pub is_blocked: bool,
    pub reason: Option<String>,
    pub blocked_until: Option<Timestamp>,
    pub source: RestrictionSource,
}

impl ChatRestriction {
    pub fn allowed(source: RestrictionSource) -> Self {
        Self {
            is_blocked: false,
            reason: None,
            blocked_until: None,
            source,
        }
    }

    fn blocked(reason: Option<String>, blocked_until: Option<Timestamp>, source: RestrictionSource) -> Self {
        Self {
            is_blocked: true,
            reason,
            blocked_until,
            source,
        }
    }

    /// Fail-closed outcome for lookup errors.
    pub fn verification_failed() -> Self {
        Self::blocked(
            Some(VERIFICATION_ERROR_REASON.to_string()),
            None,
            RestrictionSource::Error,
        )
    }

    /// Applies the precedence rules. First match wins.
    pub fn evaluate(
        role: UserRole,
        global: Option<&GlobalChatBlock>,
        user_restriction: Option<&UserChatRestriction>,
        now: &Timestamp,
    ) -> Self {
        if role.is_staff() {
            return Self::allowed(RestrictionSource::Role);
        }

        if let Some(global) = global.filter(|g| g.is_active_at(now)) {
            return Self::blocked(
                global.reason.clone(),
                global.blocked_until,
                RestrictionSource::Global,
            );
        }

        if let Some(restriction) = user_restriction.filter(|r| r.is_active_at(now)) {
            return Self::blocked(
                restriction.reason.clone(),
                Some(restriction.blocked_until),
                RestrictionSource::User,
            );
        }

        Self::allowed(RestrictionSource::None)
    }
}
