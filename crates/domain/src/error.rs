//! Domain error types.

use thiserror::Error;

use crate::order::{Event, Status};

/// The transition table is invalid or incomplete.
///
/// Raised only while building a machine; a machine that exists always holds
/// a valid table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// No status declares any eligible event.
    #[error("Transition table declares no statuses")]
    EmptyTable,

    /// A status is declared with an empty event list.
    #[error("Status({status}) has no event")]
    NoEligibleEvents { status: Status },

    /// A terminal status is declared with eligible events.
    #[error("Terminal status({status}) cannot accept events")]
    TerminalStatusHasEvents { status: Status },

    /// An eligible event has no registered handler.
    #[error("Event({event}) has no handler")]
    MissingHandler { event: Event },

    /// The same event is registered with more than one handler.
    #[error("Event({event}) has more than one handler")]
    DuplicateHandler { event: Event },

    /// The same `(status, event)` pair is declared twice.
    #[error("Status({status}) with event({event}) has been defined")]
    DuplicateTransition { status: Status, event: Event },
}

/// A transition could not be applied. The machine state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// The event is not eligible for the current status.
    #[error("Status({status}) can't handle ({event})")]
    UnhandledEvent { status: Status, event: Event },

    /// The handler rejected the transition.
    #[error("Transition ({event}) from status({status}) failed: {reason}")]
    TransitionFailed {
        status: Status,
        event: Event,
        reason: String,
    },
}
