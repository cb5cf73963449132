//! Purchase ledger port (write side).
//!
//! The ledger is the only shared mutable state in the service. Besides
//! plain reads and inserts it exposes conditional transitions that must be
//! atomic in a single round trip: two concurrent deliveries of the same
//! provider event race on `complete_if_pending`, and exactly one wins.

use async_trait::async_trait;

use crate::domain::foundation::{
    CheckoutSessionId, DomainError, Money, PurchaseId, Timestamp, UserId,
};
use crate::domain::purchase::Purchase;

/// Durable store of purchase records keyed by checkout session id.
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// Insert a new purchase.
    ///
    /// # Errors
    ///
    /// - `DuplicateSession` if a record with the same session id exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, purchase: &Purchase) -> Result<(), DomainError>;

    /// Find a purchase by its ID.
    async fn find_by_id(&self, id: &PurchaseId) -> Result<Option<Purchase>, DomainError>;

    /// Find a purchase by the provider's checkout session id.
    async fn find_by_session_id(
        &self,
        session_id: &CheckoutSessionId,
    ) -> Result<Option<Purchase>, DomainError>;

    /// Atomically move a pending purchase to completed.
    ///
    /// Sets the owner and the provider-confirmed amount only when the
    /// current status is `pending`. Returns the updated record when this
    /// call performed the transition and `None` otherwise (no record, or
    /// the record had already left `pending`).
    async fn complete_if_pending(
        &self,
        session_id: &CheckoutSessionId,
        owner: &UserId,
        amount: &Money,
        at: Timestamp,
    ) -> Result<Option<Purchase>, DomainError>;

    /// Atomically move a pending purchase to failed.
    ///
    /// Same contract as [`PurchaseLedger::complete_if_pending`].
    async fn fail_if_pending(
        &self,
        session_id: &CheckoutSessionId,
        at: Timestamp,
    ) -> Result<Option<Purchase>, DomainError>;

    /// Record that every enrollment step has succeeded.
    ///
    /// Idempotent; an earlier stamp is kept.
    async fn mark_reconciled(&self, id: &PurchaseId, at: Timestamp) -> Result<(), DomainError>;
}
