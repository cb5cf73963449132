//! HTTP DTOs for purchase endpoints.
//!
//! Money is flattened into minor-unit `price`/`amount` plus `currency`.

use serde::{Deserialize, Serialize};

use crate::application::handlers::purchase::{
    CourseDetail, CourseSummary, GetCourseWithPurchaseStatusResult, InitiateCheckoutResult,
    ListAllPurchasesResult, ListPurchasedCoursesResult, PurchaseSummary, PurchasedCourse,
    RetryPendingReconciliationsResult,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::purchase::PurchaseStatus;
use crate::ports::LearnerSummary;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to open a checkout session for one course.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutSessionRequest {
    #[serde(alias = "courseId")]
    pub course_id: String,
}

/// Query parameters for the reconciliation sweep.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileParams {
    #[serde(default)]
    pub limit: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSessionResponse {
    pub success: bool,
    /// Hosted checkout page to redirect the learner to.
    pub url: String,
}

impl From<InitiateCheckoutResult> for CheckoutSessionResponse {
    fn from(result: InitiateCheckoutResult) -> Self {
        Self {
            success: true,
            url: result.url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetailResponse {
    pub id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub price: i64,
    pub currency: String,
    pub lecture_ids: Vec<String>,
}

impl From<CourseDetail> for CourseDetailResponse {
    fn from(course: CourseDetail) -> Self {
        Self {
            id: course.id.to_string(),
            title: course.title,
            thumbnail_url: course.thumbnail_url,
            price: course.price.amount_minor(),
            currency: course.price.currency().to_string(),
            lecture_ids: course.lecture_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseWithStatusResponse {
    pub course: CourseDetailResponse,
    pub purchased: bool,
    pub purchase_status: Option<PurchaseStatus>,
}

impl From<GetCourseWithPurchaseStatusResult> for CourseWithStatusResponse {
    fn from(result: GetCourseWithPurchaseStatusResult) -> Self {
        Self {
            course: result.course.into(),
            purchased: result.purchased,
            purchase_status: result.purchase_status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummaryResponse {
    pub id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub price: i64,
    pub currency: String,
}

impl From<CourseSummary> for CourseSummaryResponse {
    fn from(course: CourseSummary) -> Self {
        Self {
            id: course.id.to_string(),
            title: course.title,
            thumbnail_url: course.thumbnail_url,
            price: course.price.amount_minor(),
            currency: course.price.currency().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchasedCourseResponse {
    pub purchase_id: String,
    pub course_id: String,
    pub amount: i64,
    pub currency: String,
    pub purchased_at: Timestamp,
    /// Null when the course no longer exists in the catalog.
    pub course: Option<CourseSummaryResponse>,
}

impl From<PurchasedCourse> for PurchasedCourseResponse {
    fn from(item: PurchasedCourse) -> Self {
        Self {
            purchase_id: item.purchase_id.to_string(),
            course_id: item.course_id.to_string(),
            amount: item.amount.amount_minor(),
            currency: item.amount.currency().to_string(),
            purchased_at: item.purchased_at,
            course: item.course.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchasedCoursesResponse {
    pub purchased_courses: Vec<PurchasedCourseResponse>,
}

impl From<ListPurchasedCoursesResult> for PurchasedCoursesResponse {
    fn from(result: ListPurchasedCoursesResult) -> Self {
        Self {
            purchased_courses: result.purchased_courses.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnerResponse {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

impl From<LearnerSummary> for LearnerResponse {
    fn from(learner: LearnerSummary) -> Self {
        Self {
            id: learner.id,
            display_name: learner.display_name,
            email: learner.email,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseListItemResponse {
    pub purchase_id: String,
    pub session_id: String,
    pub status: PurchaseStatus,
    pub amount: i64,
    pub currency: String,
    pub course_id: String,
    pub user_id: Option<UserId>,
    pub enrollment_reconciled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub learner: Option<LearnerResponse>,
    pub course: Option<CourseSummaryResponse>,
}

impl From<PurchaseSummary> for PurchaseListItemResponse {
    fn from(summary: PurchaseSummary) -> Self {
        Self {
            purchase_id: summary.purchase_id.to_string(),
            session_id: summary.session_id.to_string(),
            status: summary.status,
            amount: summary.amount.amount_minor(),
            currency: summary.amount.currency().to_string(),
            course_id: summary.course_id.to_string(),
            user_id: summary.user_id,
            enrollment_reconciled_at: summary.enrollment_reconciled_at,
            created_at: summary.created_at,
            learner: summary.learner.map(Into::into),
            course: summary.course.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AllPurchasesResponse {
    pub purchases: Vec<PurchaseListItemResponse>,
}

impl From<ListAllPurchasesResult> for AllPurchasesResponse {
    fn from(result: ListAllPurchasesResult) -> Self {
        Self {
            purchases: result.purchases.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileFailureResponse {
    pub purchase_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResponse {
    pub attempted: usize,
    pub reconciled: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ReconcileFailureResponse>,
}

impl From<RetryPendingReconciliationsResult> for ReconcileResponse {
    fn from(result: RetryPendingReconciliationsResult) -> Self {
        Self {
            attempted: result.attempted,
            reconciled: result.reconciled,
            failed: result.failed,
            failures: result
                .failures
                .into_iter()
                .map(|f| ReconcileFailureResponse {
                    purchase_id: f.purchase_id.to_string(),
                    reason: f.reason,
                })
                .collect(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
