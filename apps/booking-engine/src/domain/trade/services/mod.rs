//! Domain services for the trade lifecycle.

mod status_state_machine;

pub use status_state_machine::StatusStateMachine;
