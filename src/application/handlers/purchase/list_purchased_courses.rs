//! ListPurchasedCoursesHandler - Query handler for a learner's library.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::domain::foundation::{CourseId, Money, PurchaseId, Timestamp, UserId};
use crate::domain::purchase::{PurchaseError, PurchaseStatus};
use crate::ports::{CourseCatalog, PurchaseReader};

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};
use super::views::{lookup_distinct, CourseSummary};

#[derive(Debug, Clone)]
pub struct ListPurchasedCoursesQuery {
    pub user_id: UserId,
}

/// One completed purchase with its course.
#[derive(Debug, Clone, Serialize)]
pub struct PurchasedCourse {
    pub purchase_id: PurchaseId,
    pub course_id: CourseId,
    pub amount: Money,
    pub purchased_at: Timestamp,
    /// `None` when the course no longer exists in the catalog.
    pub course: Option<CourseSummary>,
}

#[derive(Debug, Clone)]
pub struct ListPurchasedCoursesResult {
    pub purchased_courses: Vec<PurchasedCourse>,
}

pub struct ListPurchasedCoursesHandler {
    reader: Arc<dyn PurchaseReader>,
    catalog: Arc<dyn CourseCatalog>,
    operation_timeout: Duration,
}

impl ListPurchasedCoursesHandler {
    pub fn new(reader: Arc<dyn PurchaseReader>, catalog: Arc<dyn CourseCatalog>) -> Self {
        Self {
            reader,
            catalog,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        query: ListPurchasedCoursesQuery,
    ) -> Result<ListPurchasedCoursesResult, PurchaseError> {
        let purchases = bounded(
            self.operation_timeout,
            "purchase listing",
            self.reader
                .list_by_user(&query.user_id, Some(PurchaseStatus::Completed)),
        )
        .await?;

        let catalog = &self.catalog;
        let limit = self.operation_timeout;
        let courses = lookup_distinct(purchases.iter().map(|p| p.course_id), |id: CourseId| async move {
            bounded(limit, "course lookup", catalog.find_course(&id)).await
        })
        .await?;

        let purchased_courses = purchases
            .into_iter()
            .map(|p| PurchasedCourse {
                purchase_id: p.id,
                course_id: p.course_id,
                course: courses.get(&p.course_id).map(CourseSummary::from),
                amount: p.amount,
                purchased_at: p.updated_at,
            })
            .collect();

        Ok(ListPurchasedCoursesResult { purchased_courses })
    }
}
