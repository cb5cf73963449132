//! Purchase domain - checkout records, their lifecycle, and the provider
//! notifications that drive it.

mod aggregate;
mod enrollment;
mod errors;
mod events;
mod status;
mod webhook_errors;
mod webhook_verifier;

pub use aggregate::{CompletionPlan, OwnerResolution, Purchase};
pub use enrollment::{EnrollmentStep, ReconciliationReport, StepFailure};
pub use errors::PurchaseError;
pub use events::{
    CheckoutFailureReason, CheckoutMetadata, CompletedCheckout, FailedCheckout, PaymentEvent,
    PaymentEventType,
};
pub use status::PurchaseStatus;
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{
    SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER,
};
