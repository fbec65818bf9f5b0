//! Domain layer for the order payment saga.
//!
//! This crate provides the deterministic core of the saga:
//! - Status and event vocabulary
//! - Transition context built from named options
//! - Pure event handlers
//! - A transition table validated at construction
//! - `OrderMachine`, the single-writer state machine

pub mod error;
pub mod order;

pub use error::{ConstructionError, MachineError};
pub use order::{
    ContextOption, Event, Handler, HandlerError, OrderMachine, State, StateOutput, Status,
    TransitionContext, TransitionTable,
};
