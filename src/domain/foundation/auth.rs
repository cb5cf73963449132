//! Authentication types for the domain layer.
//!
//! An [`AuthenticatedUser`] is produced by a `SessionValidator` adapter after
//! a learner's token checks out, then travels through request extensions
//! to the handlers that need the acting user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::UserId;

/// Platform role carried in the learner's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl Role {
    /// Instructors and admins may read every purchase and trigger reconciliation.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Instructor | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            _ => Err(AuthError::InvalidToken),
        }
    }
}

/// Authenticated user extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier.
    pub id: UserId,

    /// Role granted by the token.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Creates a learner with the default student role.
    pub fn student(id: UserId) -> Self {
        Self::new(id, Role::Student)
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// Token is valid but the user lacks the role for this action.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// The authentication backend is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this error indicates the user should re-authenticate.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }
}
