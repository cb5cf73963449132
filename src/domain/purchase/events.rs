//! Typed payment events.
//!
//! Provider notifications are decoded into one [`PaymentEvent`] variant per
//! event type, each with a strict schema. Decoding only ever runs on a body
//! whose signature has already been verified.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::foundation::{
    CheckoutSessionId, CourseId, Currency, Money, Timestamp, UserId,
};

use super::webhook_errors::WebhookError;

/// Checkout event types this service acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventType {
    CheckoutSessionCompleted,
    CheckoutSessionExpired,
    CheckoutSessionAsyncPaymentFailed,
}

impl PaymentEventType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checkout.session.completed" => Some(Self::CheckoutSessionCompleted),
            "checkout.session.expired" => Some(Self::CheckoutSessionExpired),
            "checkout.session.async_payment_failed" => {
                Some(Self::CheckoutSessionAsyncPaymentFailed)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::CheckoutSessionExpired => "checkout.session.expired",
            Self::CheckoutSessionAsyncPaymentFailed => "checkout.session.async_payment_failed",
        }
    }
}

/// Metadata echoed back by the provider from checkout initiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub course_id: Option<CourseId>,
    pub user_id: Option<UserId>,
}

impl CheckoutMetadata {
    pub const COURSE_ID: &'static str = "course_id";
    pub const USER_ID: &'static str = "user_id";

    /// Key/value pairs sent to the provider at session creation.
    pub fn to_pairs(course_id: &CourseId, user_id: &UserId) -> Vec<(&'static str, String)> {
        vec![
            (Self::COURSE_ID, course_id.to_string()),
            (Self::USER_ID, user_id.to_string()),
        ]
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, WebhookError> {
        let course_id = match non_blank(map.get(Self::COURSE_ID)) {
            Some(raw) => Some(CourseId::parse(raw).map_err(|e| {
                WebhookError::MalformedPayload(format!("metadata.course_id: {}", e))
            })?),
            None => None,
        };
        // Blank ids are treated as absent.
        let user_id = non_blank(map.get(Self::USER_ID)).and_then(|raw| UserId::new(raw).ok());
        Ok(Self { course_id, user_id })
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// A checkout session the provider reports as paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedCheckout {
    pub event_id: String,
    pub session_id: CheckoutSessionId,
    /// Provider-confirmed total, authoritative over the initiation price.
    pub amount_total: Money,
    pub metadata: CheckoutMetadata,
    pub created: Timestamp,
}

/// Why the provider gave up on a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutFailureReason {
    Expired,
    AsyncPaymentFailed,
}

impl CheckoutFailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::AsyncPaymentFailed => "async_payment_failed",
        }
    }
}

/// A checkout session that will never be paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCheckout {
    pub event_id: String,
    pub session_id: CheckoutSessionId,
    pub reason: CheckoutFailureReason,
    pub created: Timestamp,
}

/// A verified provider notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    CheckoutCompleted(CompletedCheckout),
    CheckoutFailed(FailedCheckout),
}

impl PaymentEvent {
    pub fn event_id(&self) -> &str {
        match self {
            PaymentEvent::CheckoutCompleted(e) => &e.event_id,
            PaymentEvent::CheckoutFailed(e) => &e.event_id,
        }
    }

    pub fn session_id(&self) -> &CheckoutSessionId {
        match self {
            PaymentEvent::CheckoutCompleted(e) => &e.session_id,
            PaymentEvent::CheckoutFailed(e) => &e.session_id,
        }
    }

    /// Decodes a verified payload.
    ///
    /// Unknown event types yield `UnsupportedEvent`; known types with a
    /// missing or mistyped field yield `MalformedPayload`.
    pub fn decode(payload: &[u8]) -> Result<Self, WebhookError> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        let event_type = PaymentEventType::parse(&envelope.event_type)
            .ok_or_else(|| WebhookError::UnsupportedEvent(envelope.event_type.clone()))?;

        let created = Timestamp::from_unix_secs(envelope.created)
            .ok_or_else(|| WebhookError::MalformedPayload("created out of range".to_string()))?;

        let session: SessionObject = serde_json::from_value(envelope.data.object)
            .map_err(|e| WebhookError::MalformedPayload(format!("data.object: {}", e)))?;
        let session_id = CheckoutSessionId::new(session.id)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        match event_type {
            PaymentEventType::CheckoutSessionCompleted => {
                let amount = session
                    .amount_total
                    .ok_or(WebhookError::MissingField("amount_total"))?;
                let currency = session
                    .currency
                    .as_deref()
                    .ok_or(WebhookError::MissingField("currency"))
                    .and_then(|c| {
                        Currency::new(c).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
                    })?;
                let amount_total = Money::new(amount, currency)
                    .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

                Ok(PaymentEvent::CheckoutCompleted(CompletedCheckout {
                    event_id: envelope.id,
                    session_id,
                    amount_total,
                    metadata: CheckoutMetadata::from_map(&session.metadata.unwrap_or_default())?,
                    created,
                }))
            }
            PaymentEventType::CheckoutSessionExpired => {
                Ok(PaymentEvent::CheckoutFailed(FailedCheckout {
                    event_id: envelope.id,
                    session_id,
                    reason: CheckoutFailureReason::Expired,
                    created,
                }))
            }
            PaymentEventType::CheckoutSessionAsyncPaymentFailed => {
                Ok(PaymentEvent::CheckoutFailed(FailedCheckout {
                    event_id: envelope.id,
                    session_id,
                    reason: CheckoutFailureReason::AsyncPaymentFailed,
                    created,
                }))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}
