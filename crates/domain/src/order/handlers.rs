//! Event handlers.
//!
//! Each handler computes the next state from the current state and the
//! transition inputs. Handlers perform no I/O; remote calls happen in the
//! coordinator before an event is dispatched.

use thiserror::Error;

use super::{State, Status, TransitionContext};

/// Signature shared by all transition handlers.
pub type Handler = fn(&State, &TransitionContext) -> Result<State, HandlerError>;

/// A handler refused to compute a next state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

// A payment ID supplied with the event wins over the one already held.
fn carried_payment_id(current: &State, ctx: &TransitionContext) -> String {
    ctx.payment_id()
        .map(str::to_owned)
        .unwrap_or_else(|| current.payment_id.clone())
}

/// `Create`: `Pending` when the order intent was accepted, `Failed` otherwise.
pub fn create(_current: &State, ctx: &TransitionContext) -> Result<State, HandlerError> {
    let status = if ctx.order_creation_succeeded().unwrap_or(false) {
        Status::Pending
    } else {
        Status::Failed
    };
    Ok(State::new(status, ""))
}

/// `Submit`: always `OrderSubmitted`, recording the payment ID.
pub fn submit(current: &State, ctx: &TransitionContext) -> Result<State, HandlerError> {
    Ok(State::new(
        Status::OrderSubmitted,
        carried_payment_id(current, ctx),
    ))
}

/// `Confirm`: `PaymentSuccess` or `PaymentFailed`.
pub fn confirm(current: &State, ctx: &TransitionContext) -> Result<State, HandlerError> {
    let status = if ctx.payment_confirmed().unwrap_or(false) {
        Status::PaymentSuccess
    } else {
        Status::PaymentFailed
    };
    Ok(State::new(status, carried_payment_id(current, ctx)))
}

pub fn order_timeout(current: &State, ctx: &TransitionContext) -> Result<State, HandlerError> {
    Ok(State::new(
        Status::OrderTimeout,
        carried_payment_id(current, ctx),
    ))
}

pub fn payment_timeout(current: &State, ctx: &TransitionContext) -> Result<State, HandlerError> {
    Ok(State::new(
        Status::PaymentTimeout,
        carried_payment_id(current, ctx),
    ))
}
