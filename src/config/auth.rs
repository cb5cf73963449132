//! Authentication configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Learner session configuration (HS256 JWT)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the learner tokens are signed with
    pub jwt_secret: SecretString,

    /// Cookie consulted when no Authorization header is sent
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production additionally requires a secret of at least 32 bytes.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__COOKIE_NAME"));
        }

        if *environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::JwtSecretTooShort);
        }

        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(String::new()),
            cookie_name: default_cookie_name(),
        }
    }
}

fn default_cookie_name() -> String {
    "token".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: SecretString::new(secret.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.cookie_name, "token");
    }

    #[test]
    fn test_validation_missing_secret() {
        let config = AuthConfig::default();
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"))
        );
    }

    #[test]
    fn test_validation_blank_cookie_name() {
        let config = AuthConfig {
            cookie_name: " ".to_string(),
            ..config("dev-secret")
        };
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_validation_production_requires_long_secret() {
        let config = config("dev-secret");
        // Allowed in development
        assert!(config.validate(&Environment::Development).is_ok());
        // Rejected in production
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::JwtSecretTooShort)
        );
    }

    #[test]
    fn test_validation_valid_production_config() {
        let config = config("0123456789abcdef0123456789abcdef");
        assert!(config.validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let config = config("super-secret-value");
        assert!(!format!("{:?}", config).contains("super-secret-value"));
    }
}
