//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Minimum HS256 key length accepted in production.
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Bearer token validation (HS256 shared secret)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret the session tokens are signed with
    pub jwt_secret: SecretString,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least 32 bytes.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::JwtSecretTooShort(MIN_PRODUCTION_SECRET_LEN));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::new(secret.to_string()),
        }
    }

    #[test]
    fn test_validation_missing_secret() {
        assert_eq!(
            config("").validate(&Environment::Development),
            Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"))
        );
    }

    #[test]
    fn test_short_secret_only_rejected_in_production() {
        let config = config("dev-secret");
        assert!(config.validate(&Environment::Development).is_ok());
        assert!(config.validate(&Environment::Production).is_err());
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let debug = format!("{:?}", config("super-secret-value"));
        assert!(!debug.contains("super-secret-value"));
    }
}
