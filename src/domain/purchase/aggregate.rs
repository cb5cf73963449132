//! Purchase aggregate.
//!
//! One record per provider checkout session. Created `pending` when the
//! session is opened, then moved to a terminal state by a verified provider
//! event. Records are never deleted.

use serde::Serialize;

use crate::domain::foundation::{
    CheckoutSessionId, CourseId, Money, PurchaseId, StateMachine, Timestamp, UserId,
};

use super::errors::PurchaseError;
use super::events::CompletedCheckout;
use super::status::PurchaseStatus;

/// A learner's purchase of a course.
///
/// # Invariants
///
/// - `session_id` is unique across all purchases
/// - `status == Completed` implies `user_id.is_some()`
/// - `status` only ever leaves `Pending`, and only once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub course_id: CourseId,
    /// Unknown only in degraded flows; recovered from event metadata.
    pub user_id: Option<UserId>,
    pub session_id: CheckoutSessionId,
    /// Initiation price while pending, provider-confirmed total once completed.
    pub amount: Money,
    pub status: PurchaseStatus,
    /// Set once every enrollment step has succeeded.
    pub enrollment_reconciled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Where the purchasing user's id came from when completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerResolution {
    /// The record already named the buyer.
    FromRecord,
    /// The record had no buyer; the event's echoed metadata supplied it.
    FromEventMetadata,
}

/// What a completion event should do to this purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionPlan {
    /// Move `pending -> completed` with these values.
    Complete {
        owner: UserId,
        owner_resolution: OwnerResolution,
        amount: Money,
    },
    /// Replay of an event already applied.
    AlreadyCompleted,
    /// The purchase reached another terminal state first.
    Terminal(PurchaseStatus),
}

impl Purchase {
    /// Opens a pending purchase for a freshly created checkout session.
    pub fn initiate(
        course_id: CourseId,
        user_id: UserId,
        session_id: CheckoutSessionId,
        amount: Money,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: PurchaseId::new(),
            course_id,
            user_id: Some(user_id),
            session_id,
            amount,
            status: PurchaseStatus::Pending,
            enrollment_reconciled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PurchaseStatus::Completed
    }

    /// Completed but not every enrollment step has succeeded yet.
    pub fn needs_reconciliation(&self) -> bool {
        self.is_completed() && self.enrollment_reconciled_at.is_none()
    }

    /// Decides how a verified completion event applies to this record.
    ///
    /// The owner comes from the record when present, otherwise from the
    /// event metadata. With neither, the purchase stays pending.
    pub fn plan_completion(&self, event: &CompletedCheckout) -> Result<CompletionPlan, PurchaseError> {
        match self.status {
            PurchaseStatus::Completed => return Ok(CompletionPlan::AlreadyCompleted),
            PurchaseStatus::Failed => return Ok(CompletionPlan::Terminal(self.status)),
            PurchaseStatus::Pending => {}
        }

        let (owner, owner_resolution) = match (&self.user_id, &event.metadata.user_id) {
            (Some(owner), _) => (owner.clone(), OwnerResolution::FromRecord),
            (None, Some(owner)) => (owner.clone(), OwnerResolution::FromEventMetadata),
            (None, None) => {
                return Err(PurchaseError::UnresolvableOwner {
                    session_id: self.session_id.clone(),
                })
            }
        };

        Ok(CompletionPlan::Complete {
            owner,
            owner_resolution,
            amount: event.amount_total.clone(),
        })
    }

    /// Applies a planned completion.
    pub fn complete(&mut self, owner: UserId, amount: Money, at: Timestamp) -> Result<(), PurchaseError> {
        self.status = self
            .status
            .transition_to(PurchaseStatus::Completed)
            .map_err(PurchaseError::from)?;
        self.user_id = Some(owner);
        self.amount = amount;
        self.updated_at = at;
        Ok(())
    }

    /// Marks a pending purchase as failed.
    pub fn fail(&mut self, at: Timestamp) -> Result<(), PurchaseError> {
        self.status = self
            .status
            .transition_to(PurchaseStatus::Failed)
            .map_err(PurchaseError::from)?;
        self.updated_at = at;
        Ok(())
    }
}
