//! HTTP adapters - REST API implementations.
//!
//! [`app_router`] assembles the full service: purchase routes under
//! `/api/v1`, the health check, the auth middleware, and the tower-http
//! stack (request ids, tracing, CORS). The request deadline applies to
//! everything except the payment webhook.

pub mod health;
pub mod middleware;
pub mod purchase;

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{auth_middleware, AuthState};
pub use purchase::{purchase_router, webhook_routes, PurchaseAppState};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Cross-cutting HTTP settings taken from the server configuration.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Builds the service router.
pub fn app_router(state: PurchaseAppState, auth: AuthState, settings: &HttpSettings) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // Webhook processing runs to completion once the ledger transition lands.
    let bounded = Router::new()
        .nest("/api/v1", purchase_router())
        .merge(health::health_routes())
        .layer(TimeoutLayer::new(settings.request_timeout));

    bounded
        .merge(webhook_routes())
        .layer(axum::middleware::from_fn_with_state(auth, auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(cors_layer(&settings.cors_origins)),
        )
        .with_state(state)
}
