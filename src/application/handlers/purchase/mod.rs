//! Purchase handlers.
//!
//! ## Commands
//! - Opening a checkout session for a course
//! - Processing payment webhooks (completion and failure)
//! - Reconciling enrollment for a completed purchase
//! - Retrying reconciliation for purchases left incomplete (admin)
//!
//! ## Queries
//! - Course detail with the caller's purchase status
//! - The caller's purchased courses
//! - All purchases (admin)

mod complete_purchase;
mod deadline;
mod fail_purchase;
mod get_course_purchase_status;
mod handle_payment_webhook;
mod initiate_checkout;
mod list_all_purchases;
mod list_purchased_courses;
mod reconcile_enrollment;
mod retry_pending_reconciliations;
mod views;

pub use deadline::DEFAULT_OPERATION_TIMEOUT;
pub use views::{CourseDetail, CourseSummary};

// Commands
pub use complete_purchase::{CompletePurchaseHandler, CompletePurchaseResult};
pub use fail_purchase::{FailPurchaseHandler, FailPurchaseResult};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
};
pub use initiate_checkout::{
    CheckoutSettings, InitiateCheckoutCommand, InitiateCheckoutHandler, InitiateCheckoutResult,
    COURSE_ID_PLACEHOLDER,
};
pub use reconcile_enrollment::{ReconcileEnrollmentCommand, ReconcileEnrollmentHandler};
pub use retry_pending_reconciliations::{
    ReconciliationFailure, RetryPendingReconciliationsCommand, RetryPendingReconciliationsHandler,
    RetryPendingReconciliationsResult, DEFAULT_RECONCILE_LIMIT,
};

// Queries
pub use get_course_purchase_status::{
    GetCourseWithPurchaseStatusHandler, GetCourseWithPurchaseStatusQuery,
    GetCourseWithPurchaseStatusResult,
};
pub use list_all_purchases::{
    ListAllPurchasesHandler, ListAllPurchasesQuery, ListAllPurchasesResult, PurchaseSummary,
};
pub use list_purchased_courses::{
    ListPurchasedCoursesHandler, ListPurchasedCoursesQuery, ListPurchasedCoursesResult,
    PurchasedCourse,
};
