use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use course_purchase::adapters::auth::JwtSessionValidator;
use course_purchase::adapters::http::{app_router, AuthState, HttpSettings, PurchaseAppState};
use course_purchase::adapters::postgres::{
    PostgresCourseCatalog, PostgresEnrollmentStore, PostgresPurchaseLedger, PostgresPurchaseReader,
};
use course_purchase::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use course_purchase::config::{AppConfig, ServerConfig};
use course_purchase::domain::purchase::StripeWebhookVerifier;

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(server.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let addr = config.server.socket_addr()?;
    tracing::info!(
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Starting course purchase service"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let catalog = Arc::new(PostgresCourseCatalog::new(pool.clone()));
    let enrollment = Arc::new(PostgresEnrollmentStore::new(pool.clone()));

    let stripe = StripePaymentAdapter::new(
        StripeConfig::new(config.payment.stripe_api_key.clone())
            .with_base_url(config.payment.api_base_url.clone())
            .with_timeout(config.server.operation_timeout()),
    )?;

    let verifier = StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone())
        .with_tolerance_secs(config.payment.webhook_tolerance_secs);

    let state = PurchaseAppState {
        catalog: catalog.clone(),
        enrollment: enrollment.clone(),
        visibility: catalog,
        learners: enrollment,
        ledger: Arc::new(PostgresPurchaseLedger::new(pool.clone())),
        reader: Arc::new(PostgresPurchaseReader::new(pool)),
        payment_provider: Arc::new(stripe),
        webhook_verifier: Arc::new(verifier),
        checkout_settings: config.payment.checkout_settings(),
        operation_timeout: config.server.operation_timeout(),
        acknowledge_orphan_events: config.payment.acknowledge_orphan_events,
    };

    let auth = AuthState::new(
        Arc::new(JwtSessionValidator::new(&config.auth.jwt_secret)),
        config.auth.cookie_name.as_str(),
    );

    let settings = HttpSettings {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = app_router(state, auth, &settings);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
