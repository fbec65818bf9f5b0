//! Payment service trait and in-memory implementation used by the saga.

pub mod payment;

pub use payment::{
    InMemoryPaymentService, OrderIntent, PaymentOperation, PaymentService, PaymentStatus,
    PaymentSubmission,
};
