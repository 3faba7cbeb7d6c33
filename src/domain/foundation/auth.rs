//! Authentication and role types for the domain layer.
//!
//! `AuthenticatedUser` is populated by the `SessionValidator` adapter from a
//! verified bearer token. Application roles (admin, moderator) are not carried
//! in the token; they come from the role lookup collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::UserId;

/// Token role granted to trusted backend callers (schedulers, cron).
pub const SERVICE_ROLE: &str = "service_role";

/// Authenticated caller extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject of the token.
    pub id: UserId,

    /// Email claim, when present.
    pub email: Option<String>,

    /// Role claim of the token itself (`authenticated`, `service_role`, ...).
    pub token_role: String,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: Option<String>, token_role: impl Into<String>) -> Self {
        Self {
            id,
            email,
            token_role: token_role.into(),
        }
    }

    /// True when the token was minted for a backend service rather than a person.
    pub fn is_service(&self) -> bool {
        self.token_role == SERVICE_ROLE
    }
}

/// Application role of a user, as reported by the role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Moderator,
    User,
}

impl UserRole {
    /// Parses a role name. Unknown names are treated as a plain user.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "moderator" => UserRole::Moderator,
            _ => UserRole::User,
        }
    }

    /// Admins and moderators bypass chat restrictions and may moderate.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Moderator)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
            UserRole::User => "user",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Caller is authenticated but lacks the required role.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The role lookup or token service could not be reached.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(UserRole::parse_lenient("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::parse_lenient(" moderator "), UserRole::Moderator);
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        assert_eq!(UserRole::parse_lenient("vip"), UserRole::User);
        assert_eq!(UserRole::parse_lenient(""), UserRole::User);
    }

    #[test]
    fn only_admin_and_moderator_are_staff() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Moderator.is_staff());
        assert!(!UserRole::User.is_staff());
        assert!(!UserRole::Moderator.is_admin());
    }

    #[test]
    fn service_token_is_detected() {
        let user = AuthenticatedUser::new(UserId::new(), None, SERVICE_ROLE);
        assert!(user.is_service());
        let user = AuthenticatedUser::new(UserId::new(), None, "authenticated");
        assert!(!user.is_service());
    }
}
