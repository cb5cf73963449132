//! Axum router configuration for purchase endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_checkout_session, get_course_detail_with_status, handle_payment_webhook,
    list_all_purchases, list_purchased_courses, reconcile_pending, PurchaseAppState,
};

/// Create the purchase API router, mounted at `/api/v1/purchase`.
///
/// # Routes
///
/// ## Learner Endpoints (require authentication)
/// - `POST /checkout/create-checkout-session` - Open a checkout session
/// - `GET /course/:course_id/detail-with-status` - Course detail plus the caller's purchase status
/// - `GET /` - The caller's completed purchases
///
/// ## Admin Endpoints (require instructor or admin)
/// - `GET /admin/all-purchases` - Every purchase with learner and course
/// - `POST /admin/reconcile` - Retry unreconciled enrollments
///
/// The webhook lives in [`webhook_routes`] so it can run without the
/// router deadline.
pub fn purchase_routes() -> Router<PurchaseAppState> {
    Router::new()
        // Learner endpoints
        .route("/", get(list_purchased_courses))
        .route("/checkout/create-checkout-session", post(create_checkout_session))
        .route(
            "/course/:course_id/detail-with-status",
            get(get_course_detail_with_status),
        )
        // Admin endpoints
        .route("/admin/all-purchases", get(list_all_purchases))
        .route("/admin/reconcile", post(reconcile_pending))
}

/// Payment provider notifications (no auth, signature verified).
///
/// Registered with full paths because the router deadline must not cut a
/// webhook off between the ledger transition and the enrollment writes.
///
/// - `POST /api/v1/purchase/webhook`
/// - `POST /api/v1/payment/webhook` - Alias
pub fn webhook_routes() -> Router<PurchaseAppState> {
    Router::new()
        .route("/api/v1/purchase/webhook", post(handle_payment_webhook))
        .route("/api/v1/payment/webhook", post(handle_payment_webhook))
}

/// Purchase routes under `/api/v1`, excluding the webhook.
pub fn purchase_router() -> Router<PurchaseAppState> {
    Router::new().nest("/purchase", purchase_routes())
}
