//! FailPurchaseHandler - Marks a purchase failed when its checkout session
//! expires or its asynchronous payment fails.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::purchase::{FailedCheckout, Purchase, PurchaseError};
use crate::ports::PurchaseLedger;

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};

/// Result of applying a failure event.
#[derive(Debug, Clone)]
pub enum FailPurchaseResult {
    /// This delivery performed `pending -> failed`.
    Failed { purchase: Purchase },
    /// The purchase was already completed or failed; left unchanged.
    AlreadyTerminal { purchase: Purchase },
}

pub struct FailPurchaseHandler {
    ledger: Arc<dyn PurchaseLedger>,
    operation_timeout: Duration,
}

impl FailPurchaseHandler {
    pub fn new(ledger: Arc<dyn PurchaseLedger>) -> Self {
        Self {
            ledger,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn handle(&self, event: FailedCheckout) -> Result<FailPurchaseResult, PurchaseError> {
        let transitioned = bounded(
            self.operation_timeout,
            "purchase failure",
            self.ledger.fail_if_pending(&event.session_id, Timestamp::now()),
        )
        .await?;

        if let Some(purchase) = transitioned {
            tracing::info!(
                purchase_id = %purchase.id,
                session_id = %purchase.session_id,
                event_id = %event.event_id,
                reason = event.reason.as_str(),
                "Purchase failed"
            );
            return Ok(FailPurchaseResult::Failed { purchase });
        }

        let current = bounded(
            self.operation_timeout,
            "purchase lookup",
            self.ledger.find_by_session_id(&event.session_id),
        )
        .await?;

        match current {
            Some(purchase) => {
                tracing::debug!(
                    purchase_id = %purchase.id,
                    status = %purchase.status,
                    reason = event.reason.as_str(),
                    "Failure event for terminal purchase ignored"
                );
                Ok(FailPurchaseResult::AlreadyTerminal { purchase })
            }
            None => {
                tracing::warn!(
                    session_id = %event.session_id,
                    event_id = %event.event_id,
                    "Failure event for unknown checkout session"
                );
                Err(PurchaseError::OrphanEvent {
                    session_id: event.session_id,
                })
            }
        }
    }
}
