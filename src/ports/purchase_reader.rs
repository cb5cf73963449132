//! Purchase reader port (query side).
//!
//! Read-only projections over the ledger. Implementations read committed
//! state directly; no caching layer sits in between.

use async_trait::async_trait;

use crate::domain::foundation::{CourseId, DomainError, UserId};
use crate::domain::purchase::{Purchase, PurchaseStatus};

/// Query access to purchase records.
#[async_trait]
pub trait PurchaseReader: Send + Sync {
    /// Purchases made by a user, newest first, optionally filtered by status.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        status: Option<PurchaseStatus>,
    ) -> Result<Vec<Purchase>, DomainError>;

    /// Purchases of one course by one user, newest first.
    async fn list_by_user_and_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Vec<Purchase>, DomainError>;

    /// Every purchase, newest first.
    async fn list_all(&self) -> Result<Vec<Purchase>, DomainError>;

    /// Completed purchases whose enrollment has not fully succeeded yet,
    /// oldest first.
    async fn list_unreconciled(&self, limit: u32) -> Result<Vec<Purchase>, DomainError>;
}
