//! Session validation port.
//!
//! HTTP middleware hands the raw bearer or cookie token to this port and
//! receives the acting user back. The HS256 JWT adapter is the production
//! implementation; tests use a token map.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts user identity.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature
/// - Reject expired tokens with `AuthError::TokenExpired`
/// - Return `AuthError::InvalidToken` for malformed or badly signed tokens
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a token (without any "Bearer " prefix) and return the user.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Role, UserId};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct MapValidator(HashMap<String, AuthenticatedUser>);

    #[async_trait]
    impl SessionValidator for MapValidator {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            self.0.get(token).cloned().ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validator_is_usable_as_trait_object() {
        let user = AuthenticatedUser::new(UserId::new("instructor-1").unwrap(), Role::Instructor);
        let validator: Arc<dyn SessionValidator> = Arc::new(MapValidator(HashMap::from([(
            "token-1".to_string(),
            user.clone(),
        )])));

        assert_eq!(validator.validate("token-1").await.unwrap(), user);
        assert_eq!(
            validator.validate("other").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
