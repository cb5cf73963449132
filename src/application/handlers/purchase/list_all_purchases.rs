//! ListAllPurchasesHandler - Administrative query over every purchase.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::domain::foundation::{CheckoutSessionId, CourseId, Money, PurchaseId, Timestamp, UserId};
use crate::domain::purchase::{PurchaseError, PurchaseStatus};
use crate::ports::{CourseCatalog, LearnerDirectory, LearnerSummary, PurchaseReader};

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};
use super::views::{lookup_distinct, CourseSummary};

/// Query to list all purchases.
///
/// Privileged callers only; the HTTP layer enforces the role.
#[derive(Debug, Clone)]
pub struct ListAllPurchasesQuery;

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseSummary {
    pub purchase_id: PurchaseId,
    pub session_id: CheckoutSessionId,
    pub status: PurchaseStatus,
    pub amount: Money,
    pub course_id: CourseId,
    pub user_id: Option<UserId>,
    pub enrollment_reconciled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub learner: Option<LearnerSummary>,
    pub course: Option<CourseSummary>,
}

#[derive(Debug, Clone)]
pub struct ListAllPurchasesResult {
    pub purchases: Vec<PurchaseSummary>,
}

pub struct ListAllPurchasesHandler {
    reader: Arc<dyn PurchaseReader>,
    catalog: Arc<dyn CourseCatalog>,
    learners: Arc<dyn LearnerDirectory>,
    operation_timeout: Duration,
}

impl ListAllPurchasesHandler {
    pub fn new(
        reader: Arc<dyn PurchaseReader>,
        catalog: Arc<dyn CourseCatalog>,
        learners: Arc<dyn LearnerDirectory>,
    ) -> Self {
        Self {
            reader,
            catalog,
            learners,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        _query: ListAllPurchasesQuery,
    ) -> Result<ListAllPurchasesResult, PurchaseError> {
        let purchases = bounded(
            self.operation_timeout,
            "purchase listing",
            self.reader.list_all(),
        )
        .await?;

        let limit = self.operation_timeout;
        let catalog = &self.catalog;
        let learners = &self.learners;
        let (courses, learner_profiles) = futures::try_join!(
            lookup_distinct(purchases.iter().map(|p| p.course_id), |id: CourseId| async move {
                bounded(limit, "course lookup", catalog.find_course(&id)).await
            }),
            lookup_distinct(
                purchases.iter().filter_map(|p| p.user_id.clone()),
                |id: UserId| async move {
                    bounded(limit, "learner lookup", learners.find_learner(&id)).await
                },
            ),
        )?;

        let purchases = purchases
            .into_iter()
            .map(|p| PurchaseSummary {
                course: courses.get(&p.course_id).map(CourseSummary::from),
                learner: p
                    .user_id
                    .as_ref()
                    .and_then(|id| learner_profiles.get(id))
                    .cloned(),
                purchase_id: p.id,
                session_id: p.session_id,
                status: p.status,
                amount: p.amount,
                course_id: p.course_id,
                user_id: p.user_id,
                enrollment_reconciled_at: p.enrollment_reconciled_at,
                created_at: p.created_at,
            })
            .collect();

        Ok(ListAllPurchasesResult { purchases })
    }
}
