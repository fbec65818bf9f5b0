//! Shared types for the order payment saga workspace.

pub mod types;

pub use types::{OrderId, ParseOrderIdError};
