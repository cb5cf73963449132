//! Payment provider port for hosted checkout sessions.
//!
//! The provider hosts the payment page; this service only opens sessions
//! and later learns their outcome through signed webhooks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CheckoutSessionId, CourseId, Money, Timestamp, UserId};
use crate::domain::purchase::PurchaseError;

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Opens a hosted checkout session for a single course.
    ///
    /// Every call opens a new session; callers must not assume idempotency.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// The single line item of a course checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    /// Product name shown on the payment page.
    pub name: String,
    pub image_url: Option<String>,
    pub unit_amount: Money,
    pub quantity: u32,
}

/// Request to open a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckoutRequest {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub line_item: CheckoutLineItem,
    /// Redirect after successful payment.
    pub success_url: String,
    /// Redirect after the buyer abandons checkout.
    pub cancel_url: String,
    /// Opaque pairs the provider echoes back on every event for this session.
    pub metadata: Vec<(String, String)>,
    /// ISO country codes allowed for the shipping address; empty disables collection.
    pub shipping_countries: Vec<String>,
}

/// Checkout session opened by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Provider's session ID.
    pub id: CheckoutSessionId,

    /// URL the buyer is redirected to.
    pub url: String,

    /// When the session expires, if the provider reports it.
    pub expires_at: Option<Timestamp>,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Timeout, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for PurchaseError {
    fn from(err: PaymentError) -> Self {
        PurchaseError::Upstream(format!("payment provider: {}", err))
    }
}

/// Payment error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// The provider did not answer in time.
    Timeout,

    /// API authentication failed.
    AuthenticationError,

    /// The provider rejected the request parameters.
    InvalidRequest,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Provider API error.
    ProviderError,
}

impl PaymentErrorCode {
    /// Returns true if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::Timeout
                | PaymentErrorCode::RateLimitExceeded
                | PaymentErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::Timeout => "timeout",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
