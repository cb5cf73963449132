//! HTTP adapter for purchase endpoints.
//!
//! - `POST /api/v1/purchase/checkout/create-checkout-session` - Start checkout for a course
//! - `POST /api/v1/purchase/webhook` - Payment provider notifications
//! - `GET /api/v1/purchase/course/:course_id/detail-with-status` - Course plus purchase status
//! - `GET /api/v1/purchase` - The caller's purchased courses
//! - `GET /api/v1/purchase/admin/all-purchases` - Every purchase (privileged)
//! - `POST /api/v1/purchase/admin/reconcile` - Retry incomplete enrollments (privileged)
//! - `POST /api/v1/payment/webhook` - Webhook alias

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{PurchaseApiError, PurchaseAppState};
pub use routes::{purchase_router, purchase_routes, webhook_routes};
