//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::application::handlers::purchase::{CheckoutSettings, COURSE_ID_PLACEHOLDER};
use crate::domain::purchase::DEFAULT_TOLERANCE_SECS;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key
    pub stripe_api_key: SecretString,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: SecretString,

    /// Stripe API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Redirect after payment; `{course_id}` is substituted
    pub success_url: String,

    /// Redirect after abandoning checkout; `{course_id}` is substituted
    pub cancel_url: String,

    /// Allowed shipping-address countries (comma-separated ISO codes)
    #[serde(default = "default_shipping_countries")]
    pub shipping_countries: String,

    /// Maximum accepted webhook age in seconds
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: u64,

    /// Answer 200 instead of 404 for events naming unknown sessions
    #[serde(default)]
    pub acknowledge_orphan_events: bool,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_live_")
    }

    pub fn shipping_countries_list(&self) -> Vec<String> {
        self.shipping_countries
            .split(',')
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Redirect and shipping settings for checkout initiation
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
            shipping_countries: self.shipping_countries_list(),
        }
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        let webhook_secret = self.stripe_webhook_secret.expose_secret();

        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        if !self.success_url.contains(COURSE_ID_PLACEHOLDER) {
            return Err(ValidationError::InvalidRedirectUrl("success_url"));
        }
        if !self.cancel_url.contains(COURSE_ID_PLACEHOLDER) {
            return Err(ValidationError::InvalidRedirectUrl("cancel_url"));
        }

        if let Some(bad) = self
            .shipping_countries_list()
            .into_iter()
            .find(|c| c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_alphabetic()))
        {
            return Err(ValidationError::InvalidShippingCountry(bad));
        }

        if self.webhook_tolerance_secs == 0 || self.webhook_tolerance_secs > 3600 {
            return Err(ValidationError::InvalidWebhookTolerance);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: SecretString::new(String::new()),
            stripe_webhook_secret: SecretString::new(String::new()),
            api_base_url: default_api_base_url(),
            success_url: String::new(),
            cancel_url: String::new(),
            shipping_countries: default_shipping_countries(),
            webhook_tolerance_secs: default_webhook_tolerance(),
            acknowledge_orphan_events: false,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_shipping_countries() -> String {
    "IN".to_string()
}

fn default_webhook_tolerance() -> u64 {
    DEFAULT_TOLERANCE_SECS as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PaymentConfig {
        PaymentConfig {
            stripe_api_key: SecretString::new("sk_test_abcd1234".to_string()),
            stripe_webhook_secret: SecretString::new("whsec_xyz789".to_string()),
            success_url: "https://learn.example.com/course/{course_id}?paid=1".to_string(),
            cancel_url: "https://learn.example.com/course/{course_id}".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_test_mode() {
        let config = valid_config();
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());
    }

    #[test]
    fn test_is_live_mode() {
        let config = PaymentConfig {
            stripe_api_key: SecretString::new("sk_live_xxx".to_string()),
            ..valid_config()
        };
        assert!(config.is_live_mode());
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_defaults() {
        let config = PaymentConfig::default();
        assert_eq!(config.api_base_url, "https://api.stripe.com");
        assert_eq!(config.shipping_countries_list(), vec!["IN".to_string()]);
        assert_eq!(config.webhook_tolerance_secs, 300);
        assert!(!config.acknowledge_orphan_events);
    }

    #[test]
    fn test_validation_missing_api_key() {
        let config = PaymentConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("STRIPE_API_KEY"))
        );
    }

    #[test]
    fn test_validation_invalid_api_key_prefix() {
        let config = PaymentConfig {
            stripe_api_key: SecretString::new("pk_test_xxx".to_string()), // Wrong prefix
            ..valid_config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStripeKey));
    }

    #[test]
    fn test_validation_invalid_webhook_secret_prefix() {
        let config = PaymentConfig {
            stripe_webhook_secret: SecretString::new("secret_xxx".to_string()), // Wrong prefix
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidStripeWebhookSecret)
        );
    }

    #[test]
    fn test_validation_redirect_without_placeholder() {
        let config = PaymentConfig {
            cancel_url: "https://learn.example.com/courses".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidRedirectUrl("cancel_url"))
        );
    }

    #[test]
    fn test_validation_bad_shipping_country() {
        let config = PaymentConfig {
            shipping_countries: "IN, India".to_string(),
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidShippingCountry("INDIA".to_string()))
        );
    }

    #[test]
    fn test_empty_shipping_countries_disables_collection() {
        let config = PaymentConfig {
            shipping_countries: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_ok());
        assert!(config.checkout_settings().shipping_countries.is_empty());
    }

    #[test]
    fn test_validation_zero_tolerance() {
        let config = PaymentConfig {
            webhook_tolerance_secs: 0,
            ..valid_config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidWebhookTolerance)
        );
    }

    #[test]
    fn test_validation_valid_config() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.checkout_settings().success_url, config.success_url);
    }
}
