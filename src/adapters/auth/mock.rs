//! Mock session validator for testing.
//!
//! # Example
//!
//! ```ignore
//! use course_purchase::adapters::auth::MockSessionValidator;
//!
//! let validator = MockSessionValidator::new()
//!     .with_test_user("learner-token", "learner-1")
//!     .with_admin("admin-token", "admin-1");
//!
//! let user = validator.validate("learner-token").await?;
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, UserId};
use crate::ports::SessionValidator;

/// Stores a map of tokens to users. Tokens not in the map return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Returned for every validation while set.
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a student token for `user_id`.
    ///
    /// # Panics
    ///
    /// Panics if `user_id` is blank.
    pub fn with_test_user(self, token: impl Into<String>, user_id: &str) -> Self {
        self.with_role(token, user_id, Role::Student)
    }

    /// Adds an admin token for `user_id`.
    ///
    /// # Panics
    ///
    /// Panics if `user_id` is blank.
    pub fn with_admin(self, token: impl Into<String>, user_id: &str) -> Self {
        self.with_role(token, user_id, Role::Admin)
    }

    fn with_role(self, token: impl Into<String>, user_id: &str, role: Role) -> Self {
        let id = UserId::new(user_id).unwrap_or_else(|e| panic!("invalid test user id: {}", e));
        self.with_user(token, AuthenticatedUser::new(id, role))
    }

    pub fn with_error(self, error: AuthError) -> Self {
        *self
            .force_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
        self
    }

    pub fn clear_error(&self) {
        *self
            .force_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Registers a new valid token at runtime.
    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into(), user);
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self
            .force_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(error);
        }

        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_tokens_resolve_with_their_role() {
        let validator = MockSessionValidator::new()
            .with_test_user("t-learner", "learner-1")
            .with_admin("t-admin", "admin-1");

        let learner = validator.validate("t-learner").await.unwrap();
        let admin = validator.validate("t-admin").await.unwrap();

        assert_eq!(learner.role, Role::Student);
        assert!(admin.is_privileged());
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = MockSessionValidator::new();
        assert_eq!(validator.validate("nope").await.unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn forced_error_wins_until_cleared() {
        let validator = MockSessionValidator::new()
            .with_test_user("t", "learner-1")
            .with_error(AuthError::service_unavailable("down"));

        assert!(matches!(
            validator.validate("t").await,
            Err(AuthError::ServiceUnavailable(_))
        ));

        validator.clear_error();
        assert!(validator.validate("t").await.is_ok());
    }
}
