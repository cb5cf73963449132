//! HandlePaymentWebhookHandler - Command handler for processing payment
//! provider webhooks.
//!
//! The raw body is authenticated before anything in it is read, then the
//! typed event is dispatched to the completion or failure handler.

use std::sync::Arc;

use crate::domain::purchase::{PaymentEvent, PurchaseError, StripeWebhookVerifier, WebhookError};

use super::complete_purchase::{CompletePurchaseHandler, CompletePurchaseResult};
use super::fail_purchase::{FailPurchaseHandler, FailPurchaseResult};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload, exactly as received.
    pub payload: Vec<u8>,
    /// Webhook signature header, if the request carried one.
    pub signature: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone)]
pub enum HandlePaymentWebhookResult {
    /// A checkout completion was applied or recognised as a replay.
    Completion(CompletePurchaseResult),
    /// A checkout failure was applied or recognised as a replay.
    Failure(FailPurchaseResult),
    /// Event verified but of a type this service does not act on.
    Ignored { event_type: String },
}

pub struct HandlePaymentWebhookHandler {
    verifier: Arc<StripeWebhookVerifier>,
    complete: CompletePurchaseHandler,
    fail: FailPurchaseHandler,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        verifier: Arc<StripeWebhookVerifier>,
        complete: CompletePurchaseHandler,
        fail: FailPurchaseHandler,
    ) -> Self {
        Self {
            verifier,
            complete,
            fail,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, PurchaseError> {
        let event = match self
            .verifier
            .verify(&cmd.payload, cmd.signature.as_deref())
        {
            Ok(event) => event,
            Err(WebhookError::UnsupportedEvent(event_type)) => {
                tracing::debug!(event_type = %event_type, "Ignoring unsupported webhook event");
                return Ok(HandlePaymentWebhookResult::Ignored { event_type });
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    authentication_failure = e.is_authentication_failure(),
                    payload_bytes = cmd.payload.len(),
                    "Webhook rejected"
                );
                return Err(e.into());
            }
        };

        tracing::debug!(
            event_id = %event.event_id(),
            session_id = %event.session_id(),
            "Webhook verified"
        );

        match event {
            PaymentEvent::CheckoutCompleted(completed) => self
                .complete
                .handle(completed)
                .await
                .map(HandlePaymentWebhookResult::Completion),
            PaymentEvent::CheckoutFailed(failed) => self
                .fail
                .handle(failed)
                .await
                .map(HandlePaymentWebhookResult::Failure),
        }
    }
}
