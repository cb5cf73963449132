//! GetCourseWithPurchaseStatusHandler - Query handler for a course page.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{CourseId, UserId};
use crate::domain::purchase::{PurchaseError, PurchaseStatus};
use crate::ports::{CourseCatalog, PurchaseReader};

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};
use super::views::CourseDetail;

#[derive(Debug, Clone)]
pub struct GetCourseWithPurchaseStatusQuery {
    pub user_id: UserId,
    /// Unvalidated course id from the request path.
    pub course_id: String,
}

#[derive(Debug, Clone)]
pub struct GetCourseWithPurchaseStatusResult {
    pub course: CourseDetail,
    /// True when the caller has a completed purchase of the course.
    pub purchased: bool,
    /// Status of the caller's most recent purchase record, if any.
    pub purchase_status: Option<PurchaseStatus>,
}

pub struct GetCourseWithPurchaseStatusHandler {
    catalog: Arc<dyn CourseCatalog>,
    reader: Arc<dyn PurchaseReader>,
    operation_timeout: Duration,
}

impl GetCourseWithPurchaseStatusHandler {
    pub fn new(catalog: Arc<dyn CourseCatalog>, reader: Arc<dyn PurchaseReader>) -> Self {
        Self {
            catalog,
            reader,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        query: GetCourseWithPurchaseStatusQuery,
    ) -> Result<GetCourseWithPurchaseStatusResult, PurchaseError> {
        let course_id = CourseId::parse(&query.course_id)?;

        let (course, purchases) = futures::try_join!(
            bounded(
                self.operation_timeout,
                "course lookup",
                self.catalog.find_course(&course_id),
            ),
            bounded(
                self.operation_timeout,
                "purchase listing",
                self.reader.list_by_user_and_course(&query.user_id, &course_id),
            ),
        )?;
        let course = course.ok_or(PurchaseError::CourseNotFound(course_id))?;

        Ok(GetCourseWithPurchaseStatusResult {
            course: course.into(),
            purchased: purchases.iter().any(|p| p.is_completed()),
            purchase_status: purchases.first().map(|p| p.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryCourseCatalog, InMemoryPurchaseLedger};
    use crate::domain::foundation::{CheckoutSessionId, Currency, LectureId, Money, Timestamp};
    use crate::domain::purchase::Purchase;
    use crate::ports::{Course, PurchaseLedger};

    struct Fixture {
        catalog: InMemoryCourseCatalog,
        ledger: InMemoryPurchaseLedger,
        course: Course,
    }

    impl Fixture {
        async fn new() -> Self {
            let catalog = InMemoryCourseCatalog::new();
            let course = Course {
                id: CourseId::new(),
                title: "Operating Systems".to_string(),
                thumbnail_url: Some("https://cdn.test/os.png".to_string()),
                price: Money::new(79_900, Currency::inr()).unwrap(),
                lecture_ids: vec![LectureId::new(), LectureId::new()],
            };
            catalog.add_course(course.clone()).await;
            Self {
                catalog,
                ledger: InMemoryPurchaseLedger::new(),
                course,
            }
        }

        fn handler(&self) -> GetCourseWithPurchaseStatusHandler {
            GetCourseWithPurchaseStatusHandler::new(
                Arc::new(self.catalog.clone()),
                Arc::new(self.ledger.clone()),
            )
        }

        async fn purchase(&self, session: &str, complete: bool) {
            let owner = UserId::new("learner-1").unwrap();
            let purchase = Purchase::initiate(
                self.course.id,
                owner.clone(),
                CheckoutSessionId::new(session).unwrap(),
                self.course.price.clone(),
            );
            self.ledger.insert(&purchase).await.unwrap();
            if complete {
                self.ledger
                    .complete_if_pending(&purchase.session_id, &owner, &purchase.amount, Timestamp::now())
                    .await
                    .unwrap();
            }
        }

        fn query(&self) -> GetCourseWithPurchaseStatusQuery {
            GetCourseWithPurchaseStatusQuery {
                user_id: UserId::new("learner-1").unwrap(),
                course_id: self.course.id.to_string(),
            }
        }
    }

    #[tokio::test]
    async fn course_without_purchase_is_not_purchased() {
        let fx = Fixture::new().await;

        let result = fx.handler().handle(fx.query()).await.unwrap();

        assert_eq!(result.course.title, "Operating Systems");
        assert_eq!(result.course.lecture_ids.len(), 2);
        assert!(!result.purchased);
        assert_eq!(result.purchase_status, None);
    }

    #[tokio::test]
    async fn pending_purchase_is_not_purchased() {
        let fx = Fixture::new().await;
        fx.purchase("cs_1", false).await;

        let result = fx.handler().handle(fx.query()).await.unwrap();

        assert!(!result.purchased);
        assert_eq!(result.purchase_status, Some(PurchaseStatus::Pending));
    }

    #[tokio::test]
    async fn completed_purchase_counts_even_behind_newer_pending_one() {
        let fx = Fixture::new().await;
        fx.purchase("cs_1", true).await;
        fx.purchase("cs_2", false).await;

        let result = fx.handler().handle(fx.query()).await.unwrap();

        assert!(result.purchased);
        assert_eq!(result.purchase_status, Some(PurchaseStatus::Pending));
    }

    #[tokio::test]
    async fn other_learners_purchases_are_not_visible() {
        let fx = Fixture::new().await;
        fx.purchase("cs_1", true).await;
        let query = GetCourseWithPurchaseStatusQuery {
            user_id: UserId::new("learner-2").unwrap(),
            ..fx.query()
        };

        let result = fx.handler().handle(query).await.unwrap();

        assert!(!result.purchased);
    }

    #[tokio::test]
    async fn malformed_and_unknown_course_ids_are_rejected() {
        let fx = Fixture::new().await;
        let handler = fx.handler();

        let malformed = handler
            .handle(GetCourseWithPurchaseStatusQuery {
                course_id: "abc".to_string(),
                ..fx.query()
            })
            .await
            .unwrap_err();
        let unknown = handler
            .handle(GetCourseWithPurchaseStatusQuery {
                course_id: CourseId::new().to_string(),
                ..fx.query()
            })
            .await
            .unwrap_err();

        assert!(matches!(malformed, PurchaseError::InvalidArgument { .. }));
        assert!(matches!(unknown, PurchaseError::CourseNotFound(_)));
    }
}
