//! Status state machine.
//!
//! Enforces the forward-only trade lifecycle. Settlement is irreversible:
//! once a stage is reached, earlier stages are unreachable.

use crate::domain::trade::errors::{TradeError, ValidationFailure, Violation};
use crate::domain::trade::value_objects::TradeStatus;

/// State machine validating trade status transitions.
pub struct StatusStateMachine;

impl StatusStateMachine {
    /// Check whether a transition is allowed.
    ///
    /// Forward moves (including fast-forwards such as PENDING → SETTLED) and
    /// same-status writes are allowed; any backward move is not.
    #[must_use]
    pub const fn is_valid_transition(from: TradeStatus, to: TradeStatus) -> bool {
        to.stage() >= from.stage()
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming both statuses when the transition
    /// moves backward.
    pub fn validate_transition(from: TradeStatus, to: TradeStatus) -> Result<(), TradeError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(TradeError::Validation(ValidationFailure::single(
                Violation::new(
                    "status",
                    "backward_transition",
                    format!("cannot move status backward from {from} to {to}"),
                ),
            )))
        }
    }
}
