//! Liveness endpoint.

use axum::{routing::get, Router};

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

pub fn health_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
