//! Transition table.
//!
//! The table is built once per machine from two static declarations: which
//! events each status accepts, and which handler serves each event. Both are
//! checked against each other at construction so a machine can never hold an
//! incomplete or ambiguous table.

use std::collections::HashMap;

use crate::error::ConstructionError;

use super::handlers::{self, Handler};
use super::{Event, Status};

/// Events accepted by each non-terminal status.
pub const ELIGIBLE_EVENTS: &[(Status, &[Event])] = &[
    (Status::Created, &[Event::Create]),
    (Status::Pending, &[Event::Submit, Event::OrderTimeoutElapsed]),
    (
        Status::OrderSubmitted,
        &[Event::Confirm, Event::PaymentTimeoutElapsed],
    ),
];

/// Handler registered for each event.
pub const EVENT_HANDLERS: &[(Event, Handler)] = &[
    (Event::Create, handlers::create),
    (Event::Submit, handlers::submit),
    (Event::Confirm, handlers::confirm),
    (Event::OrderTimeoutElapsed, handlers::order_timeout),
    (Event::PaymentTimeoutElapsed, handlers::payment_timeout),
];

/// Validated mapping of `status → (event → handler)`.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    // Events keep their declaration order.
    transitions: HashMap<Status, Vec<(Event, Handler)>>,
}

impl TransitionTable {
    /// Builds the order saga's table.
    pub fn standard() -> Result<Self, ConstructionError> {
        Self::build(ELIGIBLE_EVENTS, EVENT_HANDLERS)
    }

    /// Builds a table from a status declaration and a handler registry.
    pub fn build(
        eligible: &[(Status, &[Event])],
        handlers: &[(Event, Handler)],
    ) -> Result<Self, ConstructionError> {
        if eligible.is_empty() {
            return Err(ConstructionError::EmptyTable);
        }

        let mut registry: HashMap<Event, Handler> = HashMap::with_capacity(handlers.len());
        for (event, handler) in handlers {
            if registry.insert(*event, *handler).is_some() {
                return Err(ConstructionError::DuplicateHandler { event: *event });
            }
        }

        let mut transitions: HashMap<Status, Vec<(Event, Handler)>> = HashMap::new();
        for (status, events) in eligible {
            if events.is_empty() {
                return Err(ConstructionError::NoEligibleEvents { status: *status });
            }
            if status.is_terminal() {
                return Err(ConstructionError::TerminalStatusHasEvents { status: *status });
            }

            let entry = transitions.entry(*status).or_default();
            for event in events.iter() {
                let handler = registry
                    .get(event)
                    .copied()
                    .ok_or(ConstructionError::MissingHandler { event: *event })?;

                if entry.iter().any(|(existing, _)| existing == event) {
                    return Err(ConstructionError::DuplicateTransition {
                        status: *status,
                        event: *event,
                    });
                }
                entry.push((*event, handler));
            }
        }

        Ok(Self { transitions })
    }

    /// Returns the handler for `(status, event)`, if the event is eligible.
    pub fn handler(&self, status: Status, event: Event) -> Option<Handler> {
        self.transitions
            .get(&status)?
            .iter()
            .find(|(e, _)| *e == event)
            .map(|(_, h)| *h)
    }

    pub fn is_eligible(&self, status: Status, event: Event) -> bool {
        self.handler(status, event).is_some()
    }

    /// Events accepted in `status`, in declaration order.
    pub fn eligible_events(&self, status: Status) -> Vec<Event> {
        self.transitions
            .get(&status)
            .map(|entries| entries.iter().map(|(e, _)| *e).collect())
            .unwrap_or_default()
    }

    /// Returns true if `status` accepts no events.
    pub fn is_final(&self, status: Status) -> bool {
        !self.transitions.contains_key(&status)
    }
}
