//! Foundation module - Shared domain primitives.
//!
//! Identifiers, money, timestamps, the state machine trait, auth types and
//! the error envelope used across the purchase domain.

mod auth;
mod errors;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, Role};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CheckoutSessionId, CourseId, LectureId, PurchaseId, UserId};
pub use money::{Currency, Money};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
