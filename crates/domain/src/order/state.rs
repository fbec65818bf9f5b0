//! Saga state held by the order machine.

use serde::{Deserialize, Serialize};

use super::Status;

/// The full state of one saga instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub status: Status,
    /// Empty until a payment has been submitted.
    pub payment_id: String,
}

impl State {
    /// The state every saga instance starts in.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn new(status: Status, payment_id: impl Into<String>) -> Self {
        Self {
            status,
            payment_id: payment_id.into(),
        }
    }

    /// Returns the externally visible projection of this state.
    pub fn output(&self) -> StateOutput {
        StateOutput {
            status: self.status.as_str().to_string(),
            payment_id: self.payment_id.clone(),
        }
    }
}

/// Query result for `getOrderState`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOutput {
    pub status: String,
    pub payment_id: String,
}
