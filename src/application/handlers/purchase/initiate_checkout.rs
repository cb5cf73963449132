//! InitiateCheckoutHandler - Command handler for opening a course checkout.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{CourseId, PurchaseId, UserId};
use crate::domain::purchase::{CheckoutMetadata, Purchase, PurchaseError};
use crate::ports::{
    CheckoutLineItem, CourseCatalog, CreateCheckoutRequest, PaymentProvider, PurchaseLedger,
};

use super::deadline::{bounded, DEFAULT_OPERATION_TIMEOUT};

/// Placeholder substituted into redirect URL templates.
pub const COURSE_ID_PLACEHOLDER: &str = "{course_id}";

/// Deployment settings applied to every checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Redirect template after payment; must contain `{course_id}`.
    pub success_url: String,
    /// Redirect template after abandoning checkout.
    pub cancel_url: String,
    /// Countries accepted for the shipping address; empty disables collection.
    pub shipping_countries: Vec<String>,
}

impl CheckoutSettings {
    fn success_url_for(&self, course_id: &CourseId) -> String {
        self.success_url
            .replace(COURSE_ID_PLACEHOLDER, &course_id.to_string())
    }

    fn cancel_url_for(&self, course_id: &CourseId) -> String {
        self.cancel_url
            .replace(COURSE_ID_PLACEHOLDER, &course_id.to_string())
    }
}

/// Command to open a checkout session for a course.
#[derive(Debug, Clone)]
pub struct InitiateCheckoutCommand {
    pub user_id: UserId,
    /// Unvalidated course id as received from the caller.
    pub course_id: String,
}

/// Result of opening a checkout session.
#[derive(Debug, Clone)]
pub struct InitiateCheckoutResult {
    pub purchase_id: PurchaseId,
    pub session_id: String,
    /// Hosted payment page the buyer is redirected to.
    pub url: String,
}

/// Handler for opening checkout sessions.
///
/// The provider session is created first and the pending record written
/// second, so a provider failure never leaves a record behind.
pub struct InitiateCheckoutHandler {
    catalog: Arc<dyn CourseCatalog>,
    payment_provider: Arc<dyn PaymentProvider>,
    ledger: Arc<dyn PurchaseLedger>,
    settings: CheckoutSettings,
    operation_timeout: Duration,
}

impl InitiateCheckoutHandler {
    pub fn new(
        catalog: Arc<dyn CourseCatalog>,
        payment_provider: Arc<dyn PaymentProvider>,
        ledger: Arc<dyn PurchaseLedger>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            catalog,
            payment_provider,
            ledger,
            settings,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn handle(
        &self,
        cmd: InitiateCheckoutCommand,
    ) -> Result<InitiateCheckoutResult, PurchaseError> {
        let course_id = CourseId::parse(&cmd.course_id)?;

        let course = bounded(
            self.operation_timeout,
            "course lookup",
            self.catalog.find_course(&course_id),
        )
        .await?
        .ok_or(PurchaseError::CourseNotFound(course_id))?;

        let request = CreateCheckoutRequest {
            course_id: course.id,
            user_id: cmd.user_id.clone(),
            line_item: CheckoutLineItem {
                name: course.title.clone(),
                image_url: course.thumbnail_url.clone(),
                unit_amount: course.price.clone(),
                quantity: 1,
            },
            success_url: self.settings.success_url_for(&course.id),
            cancel_url: self.settings.cancel_url_for(&course.id),
            metadata: CheckoutMetadata::to_pairs(&course.id, &cmd.user_id)
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            shipping_countries: self.settings.shipping_countries.clone(),
        };

        let session = bounded(
            self.operation_timeout,
            "checkout session creation",
            self.payment_provider.create_checkout_session(request),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                course_id = %course.id,
                user_id = %cmd.user_id,
                error = %e,
                "Checkout session creation failed"
            );
            e
        })?;

        let purchase = Purchase::initiate(
            course.id,
            cmd.user_id,
            session.id.clone(),
            course.price,
        );
        bounded(
            self.operation_timeout,
            "ledger insert",
            self.ledger.insert(&purchase),
        )
        .await?;

        tracing::info!(
            purchase_id = %purchase.id,
            session_id = %purchase.session_id,
            course_id = %purchase.course_id,
            amount_minor = purchase.amount.amount_minor(),
            "Pending purchase recorded"
        );

        Ok(InitiateCheckoutResult {
            purchase_id: purchase.id,
            session_id: session.id.to_string(),
            url: session.url,
        })
    }
}
