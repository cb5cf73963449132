//! Stripe payment provider adapter.
//!
//! Opens hosted Checkout Sessions through the Stripe REST API. Requests are
//! form-encoded and authenticated with the secret key as the basic-auth
//! user, as Stripe expects.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_timeout(Duration::from_secs(10));
//! let adapter = StripePaymentAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{CheckoutSessionId, Timestamp};
use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, PaymentError, PaymentErrorCode, PaymentProvider,
};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout applied by the HTTP client.
    request_timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

/// Form fields for `POST /v1/checkout/sessions`.
fn checkout_form(request: &CreateCheckoutRequest) -> Vec<(String, String)> {
    let item = &request.line_item;
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "line_items[0][price_data][currency]".to_string(),
            item.unit_amount.currency().as_str().to_string(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            item.unit_amount.amount_minor().to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            item.name.clone(),
        ),
        ("line_items[0][quantity]".to_string(), item.quantity.to_string()),
    ];

    if let Some(image) = &item.image_url {
        params.push((
            "line_items[0][price_data][product_data][images][0]".to_string(),
            image.clone(),
        ));
    }
    for (key, value) in &request.metadata {
        params.push((format!("metadata[{}]", key), value.clone()));
    }
    for (i, country) in request.shipping_countries.iter().enumerate() {
        params.push((
            format!("shipping_address_collection[allowed_countries][{}]", i),
            country.clone(),
        ));
    }
    params
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Maps a non-success Stripe response to a port error.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let code = match status.as_u16() {
        401 | 403 => PaymentErrorCode::AuthenticationError,
        400 | 402 | 404 => PaymentErrorCode::InvalidRequest,
        429 => PaymentErrorCode::RateLimitExceeded,
        _ => PaymentErrorCode::ProviderError,
    };

    match serde_json::from_str::<StripeErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("Stripe returned {}", status));
            let err = PaymentError::new(code, message);
            match envelope.error.code {
                Some(provider_code) => err.with_provider_code(provider_code),
                None => err,
            }
        }
        Err(_) => PaymentError::new(code, format!("Stripe returned {}", status)),
    }
}

fn session_from_response(session: StripeCheckoutSession) -> Result<CheckoutSession, PaymentError> {
    let url = session.url.ok_or_else(|| {
        PaymentError::new(
            PaymentErrorCode::ProviderError,
            format!("Checkout session {} has no redirect URL", session.id),
        )
    })?;
    let id = CheckoutSessionId::new(session.id)
        .map_err(|e| PaymentError::new(PaymentErrorCode::ProviderError, e.to_string()))?;

    Ok(CheckoutSession {
        id,
        url,
        expires_at: session.expires_at.and_then(Timestamp::from_unix_secs),
    })
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&checkout_form(&request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PaymentError::timeout(e.to_string())
                } else {
                    PaymentError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status, &body);
            tracing::error!(
                status = status.as_u16(),
                error_code = %err.code,
                provider_code = ?err.provider_code,
                course_id = %request.course_id,
                "Stripe rejected checkout session request"
            );
            return Err(err);
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            PaymentError::new(
                PaymentErrorCode::ProviderError,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        session_from_response(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CourseId, Currency, Money, UserId};
    use crate::ports::CheckoutLineItem;

    fn request() -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            course_id: CourseId::new(),
            user_id: UserId::new("learner-1").unwrap(),
            line_item: CheckoutLineItem {
                name: "Ownership in Depth".to_string(),
                image_url: Some("https://cdn.test/own.png".to_string()),
                unit_amount: Money::new(49_900, Currency::inr()).unwrap(),
                quantity: 1,
            },
            success_url: "https://learn.test/ok".to_string(),
            cancel_url: "https://learn.test/cancel".to_string(),
            metadata: vec![
                ("course_id".to_string(), "c-1".to_string()),
                ("user_id".to_string(), "learner-1".to_string()),
            ],
            shipping_countries: vec!["IN".to_string()],
        }
    }

    fn field<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn checkout_form_describes_single_priced_line_item() {
        let form = checkout_form(&request());

        assert_eq!(field(&form, "mode"), Some("payment"));
        assert_eq!(field(&form, "line_items[0][price_data][currency]"), Some("inr"));
        assert_eq!(field(&form, "line_items[0][price_data][unit_amount]"), Some("49900"));
        assert_eq!(
            field(&form, "line_items[0][price_data][product_data][name]"),
            Some("Ownership in Depth")
        );
        assert_eq!(
            field(&form, "line_items[0][price_data][product_data][images][0]"),
            Some("https://cdn.test/own.png")
        );
        assert_eq!(field(&form, "line_items[0][quantity]"), Some("1"));
        assert_eq!(field(&form, "metadata[user_id]"), Some("learner-1"));
        assert_eq!(
            field(&form, "shipping_address_collection[allowed_countries][0]"),
            Some("IN")
        );
    }

    #[test]
    fn checkout_form_omits_optional_fields() {
        let mut req = request();
        req.line_item.image_url = None;
        req.shipping_countries.clear();

        let form = checkout_form(&req);

        assert!(form.iter().all(|(k, _)| !k.contains("images")));
        assert!(form.iter().all(|(k, _)| !k.starts_with("shipping_address_collection")));
    }

    #[test]
    fn stripe_error_body_is_mapped() {
        let body = r#"{"error":{"type":"invalid_request_error","code":"parameter_invalid_integer","message":"Invalid integer"}}"#;

        let err = error_from_response(reqwest::StatusCode::BAD_REQUEST, body);

        assert_eq!(err.code, PaymentErrorCode::InvalidRequest);
        assert_eq!(err.provider_code.as_deref(), Some("parameter_invalid_integer"));
        assert_eq!(err.message, "Invalid integer");
        assert!(!err.is_retryable());
    }

    #[test]
    fn unparsable_error_body_keeps_status_category() {
        let err = error_from_response(reqwest::StatusCode::TOO_MANY_REQUESTS, "<html>");
        assert_eq!(err.code, PaymentErrorCode::RateLimitExceeded);
        assert!(err.is_retryable());

        let err = error_from_response(reqwest::StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.code, PaymentErrorCode::AuthenticationError);
    }

    #[test]
    fn session_without_url_is_provider_error() {
        let err = session_from_response(StripeCheckoutSession {
            id: "cs_test_1".to_string(),
            url: None,
            expires_at: None,
        })
        .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::ProviderError);
    }

    #[test]
    fn session_response_is_converted() {
        let session = session_from_response(StripeCheckoutSession {
            id: "cs_test_1".to_string(),
            url: Some("https://checkout.stripe.com/c/pay/cs_test_1".to_string()),
            expires_at: Some(1_705_363_200),
        })
        .unwrap();

        assert_eq!(session.id.as_str(), "cs_test_1");
        assert_eq!(session.expires_at.unwrap().as_unix_secs(), 1_705_363_200);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = StripeConfig::new(SecretString::new("sk_test_abc".to_string()));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk_test_abc"));
        assert!(debug.contains("REDACTED"));
    }
}
