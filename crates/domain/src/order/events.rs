//! Order saga events.

use serde::{Deserialize, Serialize};

/// Triggers for a status transition.
///
/// An event is only accepted when the transition table lists it as eligible
/// for the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Result of the order-intent call is known.
    Create,

    /// A payment was submitted to the payment service.
    Submit,

    /// The payment outcome is known (signal or status poll).
    Confirm,

    /// The order-submission deadline elapsed.
    OrderTimeoutElapsed,

    /// The payment-confirmation deadline elapsed.
    PaymentTimeoutElapsed,
}

impl Event {
    /// Every event, in declaration order.
    pub const ALL: [Event; 5] = [
        Event::Create,
        Event::Submit,
        Event::Confirm,
        Event::OrderTimeoutElapsed,
        Event::PaymentTimeoutElapsed,
    ];

    /// Returns true if the event is produced by a deadline rather than a call result.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Event::OrderTimeoutElapsed | Event::PaymentTimeoutElapsed)
    }

    /// Returns the event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Create => "Create order",
            Event::Submit => "Submit payment",
            Event::Confirm => "Confirm payment",
            Event::OrderTimeoutElapsed => "Order timeout",
            Event::PaymentTimeoutElapsed => "Payment timeout",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
