//! Order status vocabulary.

use serde::{Deserialize, Serialize};

/// The status of an order payment saga.
///
/// Status transitions:
/// ```text
/// Created ──┬──► Pending ──┬──► OrderSubmitted ──┬──► PaymentSuccess
///           │              │                     ├──► PaymentFailed
///           └──► Failed    └──► OrderTimeout     └──► PaymentTimeout
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Saga instance exists, order intent not yet created.
    #[default]
    Created,

    /// The order intent was rejected (terminal state).
    Failed,

    /// Order intent created, waiting for payment submission.
    Pending,

    /// Payment submitted, waiting for confirmation.
    OrderSubmitted,

    /// Payment confirmed (terminal state).
    PaymentSuccess,

    /// Payment rejected (terminal state).
    PaymentFailed,

    /// No payment was submitted in time (terminal state).
    OrderTimeout,

    /// Payment was not confirmed in time (terminal state).
    PaymentTimeout,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Status; 8] = [
        Status::Created,
        Status::Failed,
        Status::Pending,
        Status::OrderSubmitted,
        Status::PaymentSuccess,
        Status::PaymentFailed,
        Status::OrderTimeout,
        Status::PaymentTimeout,
    ];

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Failed
                | Status::PaymentSuccess
                | Status::PaymentFailed
                | Status::OrderTimeout
                | Status::PaymentTimeout
        )
    }

    /// Returns true if the saga ended with a confirmed payment.
    pub fn is_success(&self) -> bool {
        matches!(self, Status::PaymentSuccess)
    }

    /// Returns the status display text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "CREATED",
            Status::Failed => "FAILED",
            Status::Pending => "PENDING",
            Status::OrderSubmitted => "ORDER_SUBMITTED",
            Status::PaymentSuccess => "PAYMENT_SUCCESS",
            Status::PaymentFailed => "PAYMENT_FAILED",
            Status::OrderTimeout => "ORDER_TIMEOUT",
            Status::PaymentTimeout => "PAYMENT_TIMEOUT",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
