//! Stripe webhook signature verification.
//!
//! Verifies the `Stripe-Signature` header against the raw request body using
//! HMAC-SHA256, rejects stale or future timestamps, and only then decodes the
//! body into a typed [`PaymentEvent`]. Verification has no side effects.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::events::PaymentEvent;
use super::webhook_errors::WebhookError;

/// Header carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Default maximum age for a signed payload (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Maximum allowed clock skew for future timestamps (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present; more than one appears during secret rotation.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a header of the form `t=<timestamp>,v1=<hex>[,v1=<hex>...]`.
    ///
    /// Unknown keys such as `v0` are ignored.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::MalformedHeader("expected key=value".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::MalformedHeader("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    let signature = hex::decode(value).map_err(|_| {
                        WebhookError::MalformedHeader("invalid v1 signature hex".to_string())
                    })?;
                    v1_signatures.push(signature);
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::MalformedHeader("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::MalformedHeader("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for Stripe webhook signatures.
///
/// Constructed once at startup from the endpoint signing secret and shared
/// by every webhook request.
#[derive(Debug)]
pub struct StripeWebhookVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    /// Creates a verifier with the default 5 minute tolerance.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Overrides the maximum payload age.
    pub fn with_tolerance_secs(mut self, tolerance_secs: u64) -> Self {
        self.tolerance_secs = i64::try_from(tolerance_secs).unwrap_or(i64::MAX);
        self
    }

    /// Verifies the signature against the current clock and decodes the event.
    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<PaymentEvent, WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Verifies the signature as of `now` (Unix seconds) and decodes the event.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` / `MalformedHeader` - header absent or unparsable
    /// - `TimestampOutOfRange` / `InvalidTimestamp` - outside the tolerance window
    /// - `InvalidSignature` - no v1 signature matches
    /// - `MalformedPayload` / `MissingField` / `UnsupportedEvent` - body rejected after verification
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: i64,
    ) -> Result<PaymentEvent, WebhookError> {
        let header = signature_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(WebhookError::MissingSignature)?;
        let header = SignatureHeader::parse(header)?;

        self.validate_timestamp(header.timestamp, now)?;

        let expected = self.compute_signature(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));
        if !matched {
            return Err(WebhookError::InvalidSignature);
        }

        PaymentEvent::decode(payload)
    }

    /// Produces a `Stripe-Signature` header value for `payload`.
    ///
    /// Used by local tooling and tests to sign fixtures the same way the
    /// provider does.
    pub fn signature_header(&self, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
        let signature = self.compute_signature(timestamp, payload)?;
        Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
    }

    fn validate_timestamp(&self, timestamp: i64, now: i64) -> Result<(), WebhookError> {
        let age = now.saturating_sub(timestamp);

        if age > self.tolerance_secs {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }
        Ok(())
    }

    /// HMAC-SHA256 over `"{timestamp}.{payload}"`, fed byte-for-byte.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
