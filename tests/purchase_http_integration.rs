//! Integration tests for the purchase HTTP surface.
//!
//! These tests send real requests through the assembled router:
//! 1. Authentication by Bearer header or session cookie
//! 2. Checkout request validation and response shape
//! 3. Webhook signature handling on the raw body
//! 4. Admin routes gated on role

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use async_trait::async_trait;
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use course_purchase::adapters::auth::MockSessionValidator;
use course_purchase::adapters::http::{app_router, AuthState, HttpSettings, PurchaseAppState};
use course_purchase::adapters::memory::{
    InMemoryCourseCatalog, InMemoryEnrollmentStore, InMemoryPurchaseLedger,
};
use course_purchase::adapters::stripe::MockPaymentProvider;
use course_purchase::application::handlers::purchase::CheckoutSettings;
use course_purchase::domain::foundation::{
    CourseId, Currency, DomainError, LectureId, Money, Timestamp, UserId,
};
use course_purchase::domain::purchase::{StripeWebhookVerifier, SIGNATURE_HEADER};
use course_purchase::ports::{Course, EnrollmentStore, LearnerSummary, PurchaseReader};

const WEBHOOK_SECRET: &str = "whsec_http_suite";
const STUDENT_TOKEN: &str = "student-token";
const ADMIN_TOKEN: &str = "admin-token";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Enrollment store that stalls before every write.
struct SlowEnrollment {
    inner: InMemoryEnrollmentStore,
    delay: Duration,
}

#[async_trait]
impl EnrollmentStore for SlowEnrollment {
    async fn add_enrolled_course(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<bool, DomainError> {
        tokio::time::sleep(self.delay).await;
        self.inner.add_enrolled_course(user_id, course_id).await
    }

    async fn add_enrolled_student(
        &self,
        course_id: &CourseId,
        user_id: &UserId,
    ) -> Result<bool, DomainError> {
        tokio::time::sleep(self.delay).await;
        self.inner.add_enrolled_student(course_id, user_id).await
    }
}

struct AppOptions {
    acknowledge_orphan_events: bool,
    provider: MockPaymentProvider,
    enrollment_delay: Option<Duration>,
    operation_timeout: Duration,
    request_timeout: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            acknowledge_orphan_events: false,
            provider: MockPaymentProvider::new(),
            enrollment_delay: None,
            operation_timeout: Duration::from_secs(5),
            request_timeout: HttpSettings::default().request_timeout,
        }
    }
}

struct TestApp {
    router: Router,
    ledger: InMemoryPurchaseLedger,
    enrollment: InMemoryEnrollmentStore,
    verifier: Arc<StripeWebhookVerifier>,
    course: Course,
}

impl TestApp {
    async fn new() -> Self {
        Self::build(AppOptions::default()).await
    }

    async fn with_orphan_acknowledgement(acknowledge_orphan_events: bool) -> Self {
        Self::build(AppOptions {
            acknowledge_orphan_events,
            ..Default::default()
        })
        .await
    }

    async fn build(options: AppOptions) -> Self {
        let catalog = InMemoryCourseCatalog::new();
        let course = Course {
            id: CourseId::new(),
            title: "Compilers".to_string(),
            thumbnail_url: None,
            price: Money::new(29_900, Currency::inr()).unwrap(),
            lecture_ids: vec![LectureId::new(), LectureId::new()],
        };
        catalog.add_course(course.clone()).await;

        let enrollment = InMemoryEnrollmentStore::new();
        enrollment
            .add_learner(LearnerSummary {
                id: UserId::new("learner-1").unwrap(),
                display_name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
            })
            .await;

        let ledger = InMemoryPurchaseLedger::new();
        let verifier = Arc::new(StripeWebhookVerifier::new(SecretString::new(
            WEBHOOK_SECRET.to_string(),
        )));

        let enrollment_port: Arc<dyn EnrollmentStore> = match options.enrollment_delay {
            Some(delay) => Arc::new(SlowEnrollment {
                inner: enrollment.clone(),
                delay,
            }),
            None => Arc::new(enrollment.clone()),
        };

        let state = PurchaseAppState {
            catalog: Arc::new(catalog.clone()),
            enrollment: enrollment_port,
            visibility: Arc::new(catalog.clone()),
            learners: Arc::new(enrollment.clone()),
            ledger: Arc::new(ledger.clone()),
            reader: Arc::new(ledger.clone()),
            payment_provider: Arc::new(options.provider),
            webhook_verifier: verifier.clone(),
            checkout_settings: CheckoutSettings {
                success_url: "https://learn.example.com/course/{course_id}?paid=1".to_string(),
                cancel_url: "https://learn.example.com/course/{course_id}".to_string(),
                shipping_countries: vec!["IN".to_string()],
            },
            operation_timeout: options.operation_timeout,
            acknowledge_orphan_events: options.acknowledge_orphan_events,
        };

        let validator = MockSessionValidator::new()
            .with_test_user(STUDENT_TOKEN, "learner-1")
            .with_admin(ADMIN_TOKEN, "admin-1");
        let auth = AuthState::new(Arc::new(validator), "token");

        Self {
            router: app_router(
                state,
                auth,
                &HttpSettings {
                    request_timeout: options.request_timeout,
                    ..Default::default()
                },
            ),
            ledger,
            enrollment,
            verifier,
            course,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn signature(&self, payload: &[u8]) -> String {
        self.verifier
            .signature_header(Timestamp::now().as_unix_secs(), payload)
            .unwrap()
    }

    /// Opens a checkout for the student and returns the created session id.
    async fn checkout_as_student(&self) -> String {
        let (status, _) = self
            .send_json(checkout_request(
                Some(STUDENT_TOKEN),
                json!({ "courseId": self.course.id.to_string() }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);

        let purchases = self.ledger.list_all().await.unwrap();
        purchases[0].session_id.as_str().to_string()
    }

    async fn deliver(&self, payload: Vec<u8>) -> (StatusCode, Vec<u8>) {
        let signature = self.signature(&payload);
        self.send(webhook_request(payload, Some(&signature))).await
    }
}

fn checkout_request(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/purchase/checkout/create-checkout-session")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn webhook_request(payload: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/payment/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

fn completion_event(session_id: &str) -> Vec<u8> {
    json!({
        "id": "evt_http_1",
        "object": "event",
        "type": "checkout.session.completed",
        "created": Timestamp::now().as_unix_secs(),
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "amount_total": 29_900,
                "currency": "inr",
                "metadata": { "user_id": "learner-1" }
            }
        }
    })
    .to_string()
    .into_bytes()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_check_needs_no_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_without_token_is_401() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(checkout_request(None, json!({ "courseId": app.course.id.to_string() })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.ledger.is_empty().await);
}

#[tokio::test]
async fn checkout_with_unknown_token_is_401() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(checkout_request(
            Some("forged"),
            json!({ "courseId": app.course.id.to_string() }),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn checkout_returns_hosted_page_url() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send_json(checkout_request(
            Some(STUDENT_TOKEN),
            json!({ "courseId": app.course.id.to_string() }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["url"].as_str().unwrap().starts_with("https://"));
    assert_eq!(app.ledger.len().await, 1);
}

#[tokio::test]
async fn checkout_accepts_snake_case_course_id() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(checkout_request(
            Some(STUDENT_TOKEN),
            json!({ "course_id": app.course.id.to_string() }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn checkout_with_malformed_course_id_is_400() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send_json(checkout_request(Some(STUDENT_TOKEN), json!({ "courseId": "not-a-uuid" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("INVALID_ARGUMENT"));
    assert!(app.ledger.is_empty().await);
}

#[tokio::test]
async fn checkout_without_body_field_is_400() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(checkout_request(Some(STUDENT_TOKEN), json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_for_unknown_course_is_404() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send_json(checkout_request(
            Some(STUDENT_TOKEN),
            json!({ "courseId": CourseId::new().to_string() }),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], json!("COURSE_NOT_FOUND"));
}

#[tokio::test]
async fn stalled_provider_surfaces_as_upstream_error_within_router_deadline() {
    let app = TestApp::build(AppOptions {
        provider: MockPaymentProvider::with_delay(Duration::from_millis(500)),
        operation_timeout: Duration::from_millis(50),
        request_timeout: Duration::from_secs(1),
        ..Default::default()
    })
    .await;

    let (status, body) = app
        .send_json(checkout_request(
            Some(STUDENT_TOKEN),
            json!({ "courseId": app.course.id.to_string() }),
        ))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], json!("UPSTREAM_ERROR"));
    assert!(app.ledger.is_empty().await);
}

#[tokio::test]
async fn checkout_slower_than_router_deadline_is_408() {
    let app = TestApp::build(AppOptions {
        provider: MockPaymentProvider::with_delay(Duration::from_millis(500)),
        operation_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_millis(50),
        ..Default::default()
    })
    .await;

    let (status, _) = app
        .send(checkout_request(
            Some(STUDENT_TOKEN),
            json!({ "courseId": app.course.id.to_string() }),
        ))
        .await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}

// =============================================================================
// Webhook
// =============================================================================

#[tokio::test]
async fn signed_completion_is_acknowledged_with_empty_body() {
    let app = TestApp::new().await;
    let session_id = app.checkout_as_student().await;

    let (status, body) = app.deliver(completion_event(&session_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    let learner = UserId::new("learner-1").unwrap();
    assert!(app.enrollment.enrolled_courses(&learner).await.contains(&app.course.id));
}

#[tokio::test]
async fn purchase_route_also_accepts_webhooks() {
    let app = TestApp::new().await;
    let session_id = app.checkout_as_student().await;
    let payload = completion_event(&session_id);
    let signature = app.signature(&payload);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/purchase/webhook")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn webhook_runs_past_the_router_deadline() {
    let app = TestApp::build(AppOptions {
        enrollment_delay: Some(Duration::from_millis(300)),
        operation_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_millis(100),
        ..Default::default()
    })
    .await;
    let session_id = app.checkout_as_student().await;

    let (status, _) = app.deliver(completion_event(&session_id)).await;

    assert_eq!(status, StatusCode::OK);
    let learner = UserId::new("learner-1").unwrap();
    assert!(app.enrollment.enrolled_courses(&learner).await.contains(&app.course.id));
    assert!(app.enrollment.enrolled_students(&app.course.id).await.contains(&learner));
    let purchases = app.ledger.list_all().await.unwrap();
    assert!(purchases[0].enrollment_reconciled_at.is_some());
}

#[tokio::test]
async fn webhook_without_signature_is_400() {
    let app = TestApp::new().await;
    let session_id = app.checkout_as_student().await;

    let (status, body) = app
        .send(webhook_request(completion_event(&session_id), None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Webhook Error: Missing signature header"
    );
}

#[tokio::test]
async fn tampered_webhook_body_is_400_and_changes_nothing() {
    let app = TestApp::new().await;
    let session_id = app.checkout_as_student().await;
    let payload = completion_event(&session_id);
    let signature = app.signature(&payload);
    let tampered = String::from_utf8(payload)
        .unwrap()
        .replace("29900", "1")
        .into_bytes();

    let (status, body) = app.send(webhook_request(tampered, Some(&signature))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Webhook Error: Invalid signature");
    let learner = UserId::new("learner-1").unwrap();
    assert!(app.enrollment.enrolled_courses(&learner).await.is_empty());
}

#[tokio::test]
async fn webhook_for_unknown_session_is_404() {
    let app = TestApp::new().await;

    let (status, _) = app.deliver(completion_event("cs_test_unknown")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orphan_webhook_can_be_acknowledged() {
    let app = TestApp::with_orphan_acknowledgement(true).await;

    let (status, _) = app.deliver(completion_event("cs_test_unknown")).await;

    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Learner Queries
// =============================================================================

#[tokio::test]
async fn course_detail_reports_purchase_status() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/purchase/course/{}/detail-with-status", app.course.id);

    let (status, before) = app.send_json(get(&uri, STUDENT_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["purchased"], json!(false));
    assert_eq!(before["course"]["title"], json!("Compilers"));

    let session_id = app.checkout_as_student().await;
    app.deliver(completion_event(&session_id)).await;

    let (_, after) = app.send_json(get(&uri, STUDENT_TOKEN)).await;
    assert_eq!(after["purchased"], json!(true));
}

#[tokio::test]
async fn course_detail_for_malformed_id_is_400() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(get("/api/v1/purchase/course/xyz/detail-with-status", STUDENT_TOKEN))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_cookie_authenticates_learner() {
    let app = TestApp::new().await;
    let session_id = app.checkout_as_student().await;
    app.deliver(completion_event(&session_id)).await;

    let request = Request::builder()
        .uri("/api/v1/purchase")
        .header(header::COOKIE, format!("theme=dark; token={}", STUDENT_TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_json(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchased_courses"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Admin Routes
// =============================================================================

#[tokio::test]
async fn students_cannot_list_all_purchases() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(get("/api/v1/purchase/admin/all-purchases", STUDENT_TOKEN))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_lists_purchases_with_learner_and_course() {
    let app = TestApp::new().await;
    app.checkout_as_student().await;

    let (status, body) = app
        .send_json(get("/api/v1/purchase/admin/all-purchases", ADMIN_TOKEN))
        .await;

    assert_eq!(status, StatusCode::OK);
    let purchases = body["purchases"].as_array().unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0]["status"], json!("pending"));
    assert_eq!(purchases[0]["learner"]["email"], json!("asha@example.com"));
    assert_eq!(purchases[0]["course"]["title"], json!("Compilers"));
}

#[tokio::test]
async fn admin_reconcile_sweep_reports_counts() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/purchase/admin/reconcile?limit=5")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_json(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attempted"], json!(0));
    assert_eq!(body["reconciled"], json!(0));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
