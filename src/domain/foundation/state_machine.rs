//! State machine trait for status enums.
//!
//! Lifecycle statuses implement [`StateMachine`] so every transition goes
//! through one validated path.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define the edges; `transition_to` and `is_terminal` come
/// for free.
///
/// ```ignore
/// let next = PurchaseStatus::Pending.transition_to(PurchaseStatus::Completed)?;
/// assert!(next.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "status",
                format!("cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
