//! Saga error types.

use std::time::Duration;

use common::OrderId;
use domain::{ConstructionError, MachineError, Status};
use thiserror::Error;

use crate::services::PaymentOperation;
use crate::signals::SignalChannel;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The transition table failed validation.
    #[error("Invalid transition table: {0}")]
    Construction(#[from] ConstructionError),

    /// The state machine rejected an event.
    #[error("Transition rejected: {0}")]
    Machine(#[from] MachineError),

    /// A signal payload did not match its channel's schema.
    #[error("Invalid payload on {channel}: {source}")]
    Decode {
        channel: SignalChannel,
        #[source]
        source: serde_json::Error,
    },

    /// A payment service call returned an error.
    #[error("Remote call {operation} failed: {reason}")]
    RemoteCall {
        operation: PaymentOperation,
        reason: String,
    },

    /// A payment service call did not answer in time.
    #[error("Remote call {operation} timed out after {timeout:?}")]
    RemoteTimeout {
        operation: PaymentOperation,
        timeout: Duration,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No signal channel is registered under this name.
    #[error("Unknown signal channel: {0}")]
    UnknownChannel(String),

    /// No query handler is registered under this name.
    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    /// No saga is running for this order.
    #[error("Order not found: {0}")]
    UnknownOrder(OrderId),

    /// A saga was already started for this order.
    #[error("Saga has already been started for order {0}")]
    AlreadyStarted(OrderId),

    /// The saga has stopped accepting signals.
    #[error("Saga for order {order_id} has finished with status {status}")]
    SagaFinished { order_id: OrderId, status: Status },
}

impl SagaError {
    /// Returns true for errors the coordinator absorbs without stopping the saga.
    pub fn is_contained(&self) -> bool {
        matches!(
            self,
            SagaError::Machine(_)
                | SagaError::Decode { .. }
                | SagaError::RemoteCall { .. }
                | SagaError::RemoteTimeout { .. }
        )
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use domain::Event;

    use super::*;

    #[test]
    fn test_contained_errors() {
        let unhandled = SagaError::from(MachineError::UnhandledEvent {
            status: Status::Pending,
            event: Event::Confirm,
        });
        assert!(unhandled.is_contained());

        let remote = SagaError::RemoteCall {
            operation: PaymentOperation::SubmitPayment,
            reason: "connection refused".to_string(),
        };
        assert!(remote.is_contained());

        assert!(!SagaError::from(ConstructionError::EmptyTable).is_contained());
        assert!(!SagaError::UnknownOrder(OrderId::new()).is_contained());
    }

    #[test]
    fn test_timeout_message() {
        let err = SagaError::RemoteTimeout {
            operation: PaymentOperation::GetPaymentStatus,
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "Remote call GetPaymentStatus timed out after 5s");
    }
}
