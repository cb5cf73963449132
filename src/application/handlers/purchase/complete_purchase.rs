//! CompletePurchaseHandler - Applies a verified checkout completion.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::purchase::{
    CompletedCheckout, CompletionPlan, OwnerResolution, Purchase, PurchaseError, PurchaseStatus,
    ReconciliationReport,
};
use crate::ports::PurchaseLedger;

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};
use super::reconcile_enrollment::{ReconcileEnrollmentCommand, ReconcileEnrollmentHandler};

/// Result of applying a completion event.
#[derive(Debug, Clone)]
pub enum CompletePurchaseResult {
    /// This delivery performed `pending -> completed` and enrollment ran.
    Completed {
        purchase: Purchase,
        owner_resolution: OwnerResolution,
        reconciliation: ReconciliationReport,
    },
    /// The purchase was already completed; nothing was re-applied.
    AlreadyCompleted { purchase: Purchase },
    /// The purchase had already failed; completion is not applied.
    IgnoredTerminal { purchase: Purchase },
}

impl CompletePurchaseResult {
    pub fn purchase(&self) -> &Purchase {
        match self {
            CompletePurchaseResult::Completed { purchase, .. }
            | CompletePurchaseResult::AlreadyCompleted { purchase }
            | CompletePurchaseResult::IgnoredTerminal { purchase } => purchase,
        }
    }
}

/// Handler for checkout completion events.
///
/// The status change is a single conditional update. Only the delivery that
/// wins it runs enrollment; concurrent losers observe the replay path.
pub struct CompletePurchaseHandler {
    ledger: Arc<dyn PurchaseLedger>,
    reconciler: ReconcileEnrollmentHandler,
    operation_timeout: Duration,
}

impl CompletePurchaseHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>, reconciler: ReconcileEnrollmentHandler) -> Self {
        Self {
            ledger,
            reconciler,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        event: CompletedCheckout,
    ) -> Result<CompletePurchaseResult, PurchaseError> {
        let record = self.load(&event).await?;

        if let Some(claimed) = &event.metadata.course_id {
            if claimed != &record.course_id {
                tracing::warn!(
                    session_id = %event.session_id,
                    purchase_id = %record.id,
                    course_id = %record.course_id,
                    claimed_course_id = %claimed,
                    "Event metadata names a different course; keeping the recorded course"
                );
            }
        }

        let plan = record.plan_completion(&event).map_err(|e| {
            tracing::warn!(
                session_id = %event.session_id,
                purchase_id = %record.id,
                event_id = %event.event_id,
                "Cannot resolve purchasing user; purchase left pending"
            );
            e
        })?;

        let (owner, owner_resolution, amount) = match plan {
            CompletionPlan::AlreadyCompleted => {
                tracing::debug!(
                    session_id = %event.session_id,
                    purchase_id = %record.id,
                    "Completion replayed for completed purchase"
                );
                return Ok(CompletePurchaseResult::AlreadyCompleted { purchase: record });
            }
            CompletionPlan::Terminal(status) => {
                tracing::info!(
                    session_id = %event.session_id,
                    purchase_id = %record.id,
                    status = %status,
                    "Completion ignored for terminal purchase"
                );
                return Ok(CompletePurchaseResult::IgnoredTerminal { purchase: record });
            }
            CompletionPlan::Complete {
                owner,
                owner_resolution,
                amount,
            } => (owner, owner_resolution, amount),
        };

        let transitioned = bounded(
            self.operation_timeout,
            "purchase completion",
            self.ledger
                .complete_if_pending(&event.session_id, &owner, &amount, Timestamp::now()),
        )
        .await?;

        let Some(purchase) = transitioned else {
            // Another delivery won the conditional update.
            let current = self.load(&event).await?;
            return Ok(match current.status {
                PurchaseStatus::Failed => CompletePurchaseResult::IgnoredTerminal { purchase: current },
                _ => CompletePurchaseResult::AlreadyCompleted { purchase: current },
            });
        };

        tracing::info!(
            purchase_id = %purchase.id,
            session_id = %purchase.session_id,
            event_id = %event.event_id,
            user_id = %owner,
            course_id = %purchase.course_id,
            owner_resolution = ?owner_resolution,
            amount_minor = purchase.amount.amount_minor(),
            "Purchase completed"
        );

        let reconciliation = self
            .reconciler
            .handle(ReconcileEnrollmentCommand {
                purchase_id: purchase.id,
                user_id: owner,
                course_id: purchase.course_id,
            })
            .await?;

        Ok(CompletePurchaseResult::Completed {
            purchase,
            owner_resolution,
            reconciliation,
        })
    }

    async fn load(&self, event: &CompletedCheckout) -> Result<Purchase, PurchaseError> {
        bounded(
            self.operation_timeout,
            "purchase lookup",
            self.ledger.find_by_session_id(&event.session_id),
        )
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                session_id = %event.session_id,
                event_id = %event.event_id,
                "Completion event for unknown checkout session"
            );
            PurchaseError::OrphanEvent {
                session_id: event.session_id.clone(),
            }
        })
    }
}
