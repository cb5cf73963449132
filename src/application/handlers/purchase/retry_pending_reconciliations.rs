//! RetryPendingReconciliationsHandler - Re-runs enrollment for completed
//! purchases that have not been fully reconciled.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::domain::foundation::PurchaseId;
use crate::domain::purchase::PurchaseError;
use crate::ports::PurchaseReader;

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};
use super::reconcile_enrollment::{ReconcileEnrollmentCommand, ReconcileEnrollmentHandler};

/// Batch size when the caller does not choose one.
pub const DEFAULT_RECONCILE_LIMIT: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct RetryPendingReconciliationsCommand {
    pub limit: Option<u32>,
}

/// A purchase that is still not reconciled after this pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationFailure {
    pub purchase_id: PurchaseId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryPendingReconciliationsResult {
    pub attempted: usize,
    pub reconciled: usize,
    pub failed: usize,
    pub failures: Vec<ReconciliationFailure>,
}

pub struct RetryPendingReconciliationsHandler {
    reader: Arc<dyn PurchaseReader>,
    reconciler: ReconcileEnrollmentHandler,
    operation_timeout: Duration,
}

impl RetryPendingReconciliationsHandler {
    pub fn new(reader: Arc<dyn PurchaseReader>, reconciler: ReconcileEnrollmentHandler) -> Self {
        Self {
            reader,
            reconciler,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Purchases are retried one at a time, oldest first.
    pub async fn handle(
        &self,
        cmd: RetryPendingReconciliationsCommand,
    ) -> Result<RetryPendingReconciliationsResult, PurchaseError> {
        let limit = cmd.limit.unwrap_or(DEFAULT_RECONCILE_LIMIT);
        if limit == 0 {
            return Err(PurchaseError::invalid_argument("limit", "must be at least 1"));
        }

        let pending = bounded(
            self.operation_timeout,
            "unreconciled purchase listing",
            self.reader.list_unreconciled(limit),
        )
        .await?;

        let mut result = RetryPendingReconciliationsResult {
            attempted: pending.len(),
            ..Default::default()
        };

        for purchase in pending {
            let Some(user_id) = purchase.user_id.clone() else {
                // Completed records always carry an owner.
                result.failed += 1;
                result.failures.push(ReconciliationFailure {
                    purchase_id: purchase.id,
                    reason: "completed purchase has no owner".to_string(),
                });
                continue;
            };

            let outcome = self
                .reconciler
                .handle(ReconcileEnrollmentCommand {
                    purchase_id: purchase.id,
                    user_id,
                    course_id: purchase.course_id,
                })
                .await;

            match outcome {
                Ok(_) => result.reconciled += 1,
                Err(e) => {
                    result.failed += 1;
                    result.failures.push(ReconciliationFailure {
                        purchase_id: purchase.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            attempted = result.attempted,
            reconciled = result.reconciled,
            failed = result.failed,
            "Reconciliation retry pass finished"
        );
        Ok(result)
    }
}
