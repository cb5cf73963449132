//! Mock payment provider for testing.
//!
//! Records every checkout request, hands out sequential `cs_test_*`
//! session ids, and supports error injection and artificial latency.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::CheckoutSessionId;
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let provider = MockPaymentProvider::new();
/// provider.set_error(PaymentError::network("connection reset"));
///
/// let result = provider.create_checkout_session(request).await;
/// assert!(result.is_err());
/// assert_eq!(provider.request_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    requests: Vec<CreateCheckoutRequest>,
    next_error: Option<PaymentError>,
    delay: Option<Duration>,
    sessions_opened: u32,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails with `error`.
    pub fn failing(error: PaymentError) -> Self {
        let mock = Self::new();
        mock.set_error(error);
        mock
    }

    /// A provider that sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        let mock = Self::new();
        mock.state().delay = Some(delay);
        mock
    }

    /// Makes calls fail with `error` until [`Self::clear_error`].
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    pub fn clear_error(&self) {
        self.state().next_error = None;
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<CreateCheckoutRequest> {
        self.state().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let delay = {
            let mut state = self.state();
            state.requests.push(request);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(error) = state.next_error.clone() {
            return Err(error);
        }
        state.sessions_opened += 1;
        let raw_id = format!("cs_test_{:04}", state.sessions_opened);
        let id = CheckoutSessionId::new(raw_id.clone())
            .map_err(|e| PaymentError::new(PaymentErrorCode::ProviderError, e.to_string()))?;

        Ok(CheckoutSession {
            id,
            url: format!("https://checkout.stripe.com/c/pay/{}", raw_id),
            expires_at: None,
        })
    }
}
