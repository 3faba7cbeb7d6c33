//! ResolveChatRestrictionHandler - Decides whether a user may chat right now.

use std::sync::Arc;

use crate::domain::chat::ChatRestriction;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{ChatRestrictionReader, RoleLookup};

/// Combines role, global block and personal restriction into one decision.
///
/// Never returns an error: if any lookup fails the user is blocked.
pub struct ResolveChatRestrictionHandler {
    roles: Arc<dyn RoleLookup>,
    restrictions: Arc<dyn ChatRestrictionReader>,
}

impl ResolveChatRestrictionHandler {
    pub fn new(roles: Arc<dyn RoleLookup>, restrictions: Arc<dyn ChatRestrictionReader>) -> Self {
        Self {
            roles,
            restrictions,
        }
    }

    pub async fn check(&self, user_id: &UserId) -> ChatRestriction {
        let now = Timestamp::now();

        let role = match self.roles.get_user_role(user_id).await {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Role lookup failed, blocking chat");
                return ChatRestriction::verification_failed();
            }
        };
        if role.is_staff() {
            return ChatRestriction::evaluate(role, None, None, &now);
        }

        let global = match self.restrictions.global_block().await {
            Ok(global) => global,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Global block lookup failed, blocking chat");
                return ChatRestriction::verification_failed();
            }
        };

        let personal = match self.restrictions.active_user_restriction(user_id, now).await {
            Ok(personal) => personal,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Restriction lookup failed, blocking chat");
                return ChatRestriction::verification_failed();
            }
        };

        ChatRestriction::evaluate(role, global.as_ref(), personal.as_ref(), &now)
    }
}
