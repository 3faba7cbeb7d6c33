//! HS256 JWT adapter for bearer token validation.
//!
//! Tokens are minted by the auth provider with the project's shared secret.
//! Validation checks the signature and expiry, then maps claims:
//!
//! - `sub` → `UserId` (a UUID)
//! - `role` → token role (`authenticated`, `service_role`, ...)
//! - `email` → optional email
//!
//! Service tokens may omit `sub`; they are given the nil user id.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId, SERVICE_ROLE};
use crate::ports::SessionValidator;

/// Role assumed when a token carries no `role` claim.
const DEFAULT_TOKEN_ROLE: &str = "authenticated";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    fn user_from_claims(claims: Claims) -> Result<AuthenticatedUser, AuthError> {
        let role = claims
            .role
            .unwrap_or_else(|| DEFAULT_TOKEN_ROLE.to_string());

        let id = match claims.sub.as_deref() {
            Some(sub) => Uuid::parse_str(sub).map_err(|_| {
                tracing::debug!("Token subject is not a UUID");
                AuthError::InvalidToken
            })?,
            None if role == SERVICE_ROLE => Uuid::nil(),
            None => return Err(AuthError::InvalidToken),
        };

        Ok(AuthenticatedUser::new(UserId::from_uuid(id), claims.email, role))
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        Self::user_from_claims(data.claims)
    }
}
