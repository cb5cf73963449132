//! Errors raised while authenticating and decoding provider notifications.

use axum::http::StatusCode;
use thiserror::Error;

/// Rejections produced at the webhook boundary, before any state is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// No signature header accompanied the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// The signature header could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedHeader(String),

    /// No supplied signature matches the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The signed timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// The signed timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// The verified body does not match the schema of its event type.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A required field is absent from the verified body.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The event type is not one this service handles.
    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),
}

impl WebhookError {
    /// True when the payload was rejected for authenticity reasons.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::MalformedHeader(_)
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
                | WebhookError::InvalidTimestamp
        )
    }

    /// Maps the error to the status returned to the provider.
    ///
    /// Unsupported events are acknowledged so the provider stops
    /// redelivering them; everything else is a non-retryable 400.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::UnsupportedEvent(_) => StatusCode::OK,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
