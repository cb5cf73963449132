//! Money value object.
//!
//! Amounts are integers in the currency's minor unit (paise for `inr`).
//! The payment provider speaks the same unit, so no scaling happens anywhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Three-letter lowercase ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim().to_ascii_lowercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected a three-letter ISO code",
            ));
        }
        Ok(Self(code))
    }

    /// Indian rupee, the catalog default.
    pub fn inr() -> Self {
        Self("inr".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-negative amount in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Money {
    amount_minor: i64,
    currency: Currency,
}

impl Money {
    pub fn new(amount_minor: i64, currency: Currency) -> Result<Self, ValidationError> {
        if amount_minor < 0 {
            return Err(ValidationError::negative("amount", amount_minor));
        }
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    pub fn amount_minor(&self) -> i64 {
        self.amount_minor
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount_minor, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_normalizes_case() {
        assert_eq!(Currency::new("INR").unwrap(), Currency::inr());
    }

    #[test]
    fn currency_rejects_bad_codes() {
        assert!(Currency::new("rupee").is_err());
        assert!(Currency::new("in1").is_err());
        assert!(Currency::new("").is_err());
    }

    #[test]
    fn currency_deserializes_through_validation() {
        let ok: Currency = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(ok.as_str(), "usd");
        assert!(serde_json::from_str::<Currency>("\"dollars\"").is_err());
    }

    #[test]
    fn money_rejects_negative_amounts() {
        let err = Money::new(-1, Currency::inr()).unwrap_err();
        assert_eq!(err.field(), "amount");
    }

    #[test]
    fn money_displays_amount_and_currency() {
        let money = Money::new(50000, Currency::inr()).unwrap();
        assert_eq!(money.to_string(), "50000 inr");
    }
}
