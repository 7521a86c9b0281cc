//! Listing availability state machine
//!
//! ```text
//! Available --MarkSold--> Sold --MarkAvailable--> Available
//! ```

use thrift_common::StateError;

use super::entities::ListingStatus;

/// Events that change a listing's availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingEvent {
    MarkSold,
    MarkAvailable,
}

impl std::fmt::Display for ListingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MarkSold => write!(f, "mark_sold"),
            Self::MarkAvailable => write!(f, "mark_available"),
        }
    }
}

/// Listing state machine
pub struct ListingStateMachine;

impl ListingStateMachine {
    /// Attempt a state transition
    pub fn transition(
        current: ListingStatus,
        event: ListingEvent,
    ) -> Result<ListingStatus, StateError> {
        match (current, event) {
            (ListingStatus::Available, ListingEvent::MarkSold) => Ok(ListingStatus::Sold),
            (ListingStatus::Sold, ListingEvent::MarkAvailable) => Ok(ListingStatus::Available),
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }

    /// The event that flips `current`
    pub fn toggle_event(current: ListingStatus) -> ListingEvent {
        match current {
            ListingStatus::Available => ListingEvent::MarkSold,
            ListingStatus::Sold => ListingEvent::MarkAvailable,
        }
    }

    pub fn can_transition(current: ListingStatus, event: ListingEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
