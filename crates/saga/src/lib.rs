//! Saga coordinator for the order payment lifecycle.
//!
//! Each saga instance owns an `OrderMachine` and drives it with a loop that
//! races named signals against deadlines:
//! 1. Request an order intent (`CREATED` → `PENDING` or `FAILED`)
//! 2. Wait for `submitPayment` or the order timeout (`PENDING`)
//! 3. Wait for `paymentResult`, a successful status poll, or the payment
//!    timeout (`ORDER_SUBMITTED`)
//!
//! The current state can be queried at any time through `getOrderState`.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod handle;
pub mod registry;
pub mod services;
pub mod signals;
pub mod trigger;

pub use config::{RetryPolicy, SagaConfig};
pub use coordinator::{SAGA_TYPE, SagaCoordinator};
pub use error::SagaError;
pub use handle::{SagaHandle, SagaOutcome};
pub use registry::{SagaRegistry, SagaSummary};
pub use services::{
    InMemoryPaymentService, OrderIntent, PaymentOperation, PaymentService, PaymentStatus,
    PaymentSubmission,
};
pub use signals::{
    PaymentResultSignal, QUERY_ORDER_STATE, SignalChannel, SignalPayload, SubmitPaymentSignal,
};
pub use trigger::{Armed, SignalInbox, SignalSender, Trigger, signal_channels};
