//! Mock session validator for tests.
//!
//! Maps literal tokens to callers so HTTP tests can authenticate without
//! minting JWTs.
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_user("user-token", user_id)
//!     .with_service("cron-token");
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId, SERVICE_ROLE};
use crate::ports::SessionValidator;

#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for an ordinary signed-in user.
    pub fn with_user(self, token: impl Into<String>, user_id: UserId) -> Self {
        self.add_token(
            token,
            AuthenticatedUser::new(user_id, None, "authenticated"),
        );
        self
    }

    /// Registers a service-role token.
    pub fn with_service(self, token: impl Into<String>) -> Self {
        self.add_token(
            token,
            AuthenticatedUser::new(UserId::from_uuid(uuid::Uuid::nil()), None, SERVICE_ROLE),
        );
        self
    }

    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(token.into(), user);
        }
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.tokens
            .read()
            .map_err(|_| AuthError::ServiceUnavailable("token table poisoned".into()))?
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
