//! Purchase status state machine.
//!
//! `pending` is the only non-terminal state. Both `completed` and `failed`
//! are final for this service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of a purchase record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Checkout session opened, provider has not confirmed payment.
    Pending,

    /// Provider confirmed payment. Never reverts.
    Completed,

    /// Provider reported the session expired or the payment failed.
    Failed,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            "failed" => Ok(PurchaseStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown purchase status '{}'", other),
            )),
        }
    }
}

impl StateMachine for PurchaseStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PurchaseStatus::*;
        matches!((self, target), (Pending, Completed) | (Pending, Failed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PurchaseStatus::*;
        match self {
            Pending => vec![Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}
