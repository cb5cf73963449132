//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe Checkout. Webhook
//! signature verification lives with the purchase domain so the raw
//! payload never has to leave it before it is trusted.
//!
//! # Security
//!
//! - The API key is held as `secrecy::SecretString` and redacted from `Debug`
//! - Every request carries a client-side timeout

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::MockPaymentProvider;
pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
