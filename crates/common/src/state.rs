//! State machine error type shared by domain crates that model status
//! transitions (listing availability).

use thiserror::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot go from {from} via {event}")]
    InvalidTransition { from: String, event: String },
}

impl From<StateError> for crate::Error {
    fn from(err: StateError) -> Self {
        crate::Error::Validation(err.to_string())
    }
}
