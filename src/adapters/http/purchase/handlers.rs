//! HTTP handlers for purchase endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::{RequireAuth, RequirePrivileged};
use crate::application::handlers::purchase::{
    CheckoutSettings, CompletePurchaseHandler, FailPurchaseHandler,
    GetCourseWithPurchaseStatusHandler, GetCourseWithPurchaseStatusQuery,
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, InitiateCheckoutCommand,
    InitiateCheckoutHandler, ListAllPurchasesHandler, ListAllPurchasesQuery,
    ListPurchasedCoursesHandler, ListPurchasedCoursesQuery, ReconcileEnrollmentHandler,
    RetryPendingReconciliationsCommand, RetryPendingReconciliationsHandler,
};
use crate::domain::purchase::{PurchaseError, StripeWebhookVerifier, SIGNATURE_HEADER};
use crate::ports::{
    CourseCatalog, EnrollmentStore, LearnerDirectory, LectureVisibility, PaymentProvider,
    PurchaseLedger, PurchaseReader,
};

use super::dto::{
    AllPurchasesResponse, CheckoutSessionResponse, CourseWithStatusResponse,
    CreateCheckoutSessionRequest, ErrorResponse, PurchasedCoursesResponse, ReconcileParams,
    ReconcileResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; handlers are built on demand from the
/// Arc-wrapped ports.
#[derive(Clone)]
pub struct PurchaseAppState {
    pub catalog: Arc<dyn CourseCatalog>,
    pub enrollment: Arc<dyn EnrollmentStore>,
    pub visibility: Arc<dyn LectureVisibility>,
    pub learners: Arc<dyn LearnerDirectory>,
    pub ledger: Arc<dyn PurchaseLedger>,
    pub reader: Arc<dyn PurchaseReader>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub webhook_verifier: Arc<StripeWebhookVerifier>,
    pub checkout_settings: CheckoutSettings,
    pub operation_timeout: Duration,
    /// Answer 200 to events naming sessions this service never created.
    pub acknowledge_orphan_events: bool,
}

impl PurchaseAppState {
    pub fn initiate_checkout_handler(&self) -> InitiateCheckoutHandler {
        InitiateCheckoutHandler::new(
            self.catalog.clone(),
            self.payment_provider.clone(),
            self.ledger.clone(),
            self.checkout_settings.clone(),
        )
        .with_timeout(self.operation_timeout)
    }

    pub fn reconcile_handler(&self) -> ReconcileEnrollmentHandler {
        ReconcileEnrollmentHandler::new(
            self.catalog.clone(),
            self.enrollment.clone(),
            self.visibility.clone(),
            self.ledger.clone(),
        )
        .with_timeout(self.operation_timeout)
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        let complete = CompletePurchaseHandler::new(self.ledger.clone(), self.reconcile_handler())
            .with_timeout(self.operation_timeout);
        let fail = FailPurchaseHandler::new(self.ledger.clone()).with_timeout(self.operation_timeout);
        HandlePaymentWebhookHandler::new(self.webhook_verifier.clone(), complete, fail)
    }

    pub fn course_status_handler(&self) -> GetCourseWithPurchaseStatusHandler {
        GetCourseWithPurchaseStatusHandler::new(self.catalog.clone(), self.reader.clone())
            .with_timeout(self.operation_timeout)
    }

    pub fn purchased_courses_handler(&self) -> ListPurchasedCoursesHandler {
        ListPurchasedCoursesHandler::new(self.reader.clone(), self.catalog.clone())
            .with_timeout(self.operation_timeout)
    }

    pub fn all_purchases_handler(&self) -> ListAllPurchasesHandler {
        ListAllPurchasesHandler::new(
            self.reader.clone(),
            self.catalog.clone(),
            self.learners.clone(),
        )
        .with_timeout(self.operation_timeout)
    }

    pub fn retry_reconciliations_handler(&self) -> RetryPendingReconciliationsHandler {
        RetryPendingReconciliationsHandler::new(self.reader.clone(), self.reconcile_handler())
            .with_timeout(self.operation_timeout)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Learner Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/v1/purchase/checkout/create-checkout-session
pub async fn create_checkout_session(
    State(state): State<PurchaseAppState>,
    RequireAuth(user): RequireAuth,
    body: Result<Json<CreateCheckoutSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PurchaseApiError> {
    let Json(request) = body.map_err(|rejection| {
        PurchaseError::invalid_argument("course_id", rejection.body_text())
    })?;

    let cmd = InitiateCheckoutCommand {
        user_id: user.id,
        course_id: request.course_id,
    };
    let result = state.initiate_checkout_handler().handle(cmd).await?;

    Ok(Json(CheckoutSessionResponse::from(result)))
}

/// GET /api/v1/purchase/course/:course_id/detail-with-status
pub async fn get_course_detail_with_status(
    State(state): State<PurchaseAppState>,
    RequireAuth(user): RequireAuth,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, PurchaseApiError> {
    let query = GetCourseWithPurchaseStatusQuery {
        user_id: user.id,
        course_id,
    };
    let result = state.course_status_handler().handle(query).await?;

    Ok(Json(CourseWithStatusResponse::from(result)))
}

/// GET /api/v1/purchase
pub async fn list_purchased_courses(
    State(state): State<PurchaseAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, PurchaseApiError> {
    let query = ListPurchasedCoursesQuery { user_id: user.id };
    let result = state.purchased_courses_handler().handle(query).await?;

    Ok(Json(PurchasedCoursesResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/v1/purchase/admin/all-purchases
pub async fn list_all_purchases(
    State(state): State<PurchaseAppState>,
    RequirePrivileged(_user): RequirePrivileged,
) -> Result<impl IntoResponse, PurchaseApiError> {
    let result = state
        .all_purchases_handler()
        .handle(ListAllPurchasesQuery)
        .await?;

    Ok(Json(AllPurchasesResponse::from(result)))
}

/// POST /api/v1/purchase/admin/reconcile
pub async fn reconcile_pending(
    State(state): State<PurchaseAppState>,
    RequirePrivileged(user): RequirePrivileged,
    Query(params): Query<ReconcileParams>,
) -> Result<impl IntoResponse, PurchaseApiError> {
    tracing::info!(user_id = %user.id, limit = ?params.limit, "Reconciliation sweep requested");

    let cmd = RetryPendingReconciliationsCommand {
        limit: params.limit,
    };
    let result = state.retry_reconciliations_handler().handle(cmd).await?;

    Ok(Json(ReconcileResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/v1/purchase/webhook (also /api/v1/payment/webhook)
///
/// Takes the body as raw bytes; the signature covers the exact payload.
/// Success is an empty 200. Error bodies never echo payload contents.
pub async fn handle_payment_webhook(
    State(state): State<PurchaseAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match state.webhook_handler().handle(cmd).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(err) => webhook_error_response(err, state.acknowledge_orphan_events),
    }
}

fn webhook_error_response(err: PurchaseError, acknowledge_orphans: bool) -> Response {
    match &err {
        PurchaseError::Unauthenticated(reason) => {
            let summary = reason.split_once(':').map_or(reason.as_str(), |(head, _)| head);
            (StatusCode::BAD_REQUEST, format!("Webhook Error: {}", summary)).into_response()
        }
        PurchaseError::OrphanEvent { .. } if acknowledge_orphans => StatusCode::OK.into_response(),
        PurchaseError::OrphanEvent { .. } => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(err.code(), "Unknown checkout session")),
        )
            .into_response(),
        _ => {
            tracing::error!(error = %err, retryable = err.is_retryable(), "Webhook processing failed");
            (
                err.status_code(),
                Json(ErrorResponse::new(err.code(), "Webhook processing failed")),
            )
                .into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts purchase errors to HTTP responses.
#[derive(Debug)]
pub struct PurchaseApiError(pub PurchaseError);

impl From<PurchaseError> for PurchaseApiError {
    fn from(err: PurchaseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PurchaseApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "Purchase request failed");
            ErrorResponse::new(self.0.code(), "Internal server error")
        } else {
            ErrorResponse::new(self.0.code(), self.0.to_string())
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CheckoutSessionId, PurchaseId};
    use crate::domain::purchase::{EnrollmentStep, StepFailure, WebhookError};

    fn orphan() -> PurchaseError {
        PurchaseError::OrphanEvent {
            session_id: CheckoutSessionId::new("cs_unknown").unwrap(),
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn signature_failure_is_400_with_summary() {
        let response = webhook_error_response(WebhookError::InvalidSignature.into(), false);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Webhook Error: Invalid signature");
    }

    #[tokio::test]
    async fn malformed_payload_summary_hides_parser_detail() {
        let err: PurchaseError =
            WebhookError::MalformedPayload("expected value at line 1 column 1".to_string()).into();

        let response = webhook_error_response(err, false);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Webhook Error: Malformed payload");
    }

    #[test]
    fn orphan_event_is_404_by_default() {
        assert_eq!(
            webhook_error_response(orphan(), false).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn orphan_event_can_be_acknowledged() {
        assert_eq!(webhook_error_response(orphan(), true).status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn enrollment_failure_on_webhook_is_500_with_generic_body() {
        let err = PurchaseError::EnrollmentIncomplete {
            purchase_id: PurchaseId::new(),
            failures: vec![StepFailure::new(EnrollmentStep::LecturePreview, "db password wrong")],
        };

        let response = webhook_error_response(err, false);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        assert!(text.contains("ENROLLMENT_INCOMPLETE"));
        assert!(!text.contains("db password"));
    }

    #[tokio::test]
    async fn api_error_keeps_client_error_message() {
        let response =
            PurchaseApiError(PurchaseError::invalid_argument("course_id", "expected a UUID"))
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["error_code"], "INVALID_ARGUMENT");
        assert!(json["message"].as_str().unwrap().contains("expected a UUID"));
    }

    #[tokio::test]
    async fn api_error_hides_server_error_detail() {
        let response =
            PurchaseApiError(PurchaseError::upstream("connection refused to 10.0.0.3")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let text = body_text(response).await;
        assert!(text.contains("UPSTREAM_ERROR"));
        assert!(!text.contains("10.0.0.3"));
    }
}
