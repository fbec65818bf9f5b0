//! Finite state machine for one order saga.

use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::{ConstructionError, MachineError};

use super::{ContextOption, Event, State, StateOutput, Status, TransitionContext, TransitionTable};

/// Holds the state of one saga instance and applies events to it.
///
/// Transitions are single-writer: concurrent [`call`](Self::call)s on one
/// machine are serialized, and each one sees the state committed by the
/// previous. Readers take a snapshot under a short read lock and never
/// observe a transition in progress.
#[derive(Debug)]
pub struct OrderMachine {
    table: TransitionTable,
    state: RwLock<State>,
    writer: Mutex<()>,
}

impl OrderMachine {
    /// Creates a machine with the standard table in the initial state.
    pub fn new() -> Result<Self, ConstructionError> {
        Ok(Self::with_table(TransitionTable::standard()?))
    }

    pub fn with_table(table: TransitionTable) -> Self {
        Self::from_state(table, State::initial())
    }

    /// Creates a machine positioned at an arbitrary state.
    pub fn from_state(table: TransitionTable, state: State) -> Self {
        Self {
            table,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        }
    }

    /// Applies `event` with inputs built from `options`, in order.
    pub fn call(
        &self,
        event: Event,
        options: impl IntoIterator<Item = ContextOption>,
    ) -> Result<State, MachineError> {
        self.call_with(event, options.into_iter().collect())
    }

    /// Applies `event` with a prepared context.
    ///
    /// On error the held state is left exactly as it was.
    pub fn call_with(&self, event: Event, ctx: TransitionContext) -> Result<State, MachineError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.state();
        let handler = self.table.handler(current.status, event).ok_or_else(|| {
            tracing::warn!(status = %current.status, %event, "event not eligible");
            MachineError::UnhandledEvent {
                status: current.status,
                event,
            }
        })?;

        let next = handler(&current, &ctx).map_err(|e| MachineError::TransitionFailed {
            status: current.status,
            event,
            reason: e.to_string(),
        })?;

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();

        metrics::counter!("fsm_transitions_total", "event" => event.as_str()).increment(1);
        tracing::debug!(from = %current.status, to = %next.status, %event, "transition committed");

        Ok(next)
    }

    /// Returns a snapshot of the committed state.
    pub fn state(&self) -> State {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> Status {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
    }

    /// Returns the `getOrderState` query result.
    pub fn state_output(&self) -> StateOutput {
        self.state().output()
    }

    /// Events accepted in the current status.
    pub fn eligible_events(&self) -> Vec<Event> {
        self.table.eligible_events(self.status())
    }

    pub fn can_handle(&self, event: Event) -> bool {
        self.table.is_eligible(self.status(), event)
    }

    /// Returns true once the current status accepts no further events.
    pub fn is_finished(&self) -> bool {
        self.table.is_final(self.status())
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::handlers::{self, Handler, HandlerError};
    use crate::order::table::ELIGIBLE_EVENTS;

    fn machine_at(status: Status, payment_id: &str) -> OrderMachine {
        OrderMachine::from_state(
            TransitionTable::standard().unwrap(),
            State::new(status, payment_id),
        )
    }

    #[test]
    fn test_new_machine_starts_created() {
        let machine = OrderMachine::new().unwrap();
        assert_eq!(machine.status(), Status::Created);
        assert_eq!(machine.eligible_events(), vec![Event::Create]);
        assert!(!machine.is_finished());
    }

    #[test]
    fn test_unhandled_event_leaves_state_unchanged() {
        let machine = OrderMachine::new().unwrap();
        let err = machine
            .call(Event::Confirm, [ContextOption::PaymentConfirmed(true)])
            .unwrap_err();
        assert_eq!(
            err,
            MachineError::UnhandledEvent {
                status: Status::Created,
                event: Event::Confirm
            }
        );
        assert_eq!(machine.state(), State::initial());
    }

    #[test]
    fn test_handler_failure_leaves_state_unchanged() {
        fn reject(_: &State, _: &TransitionContext) -> Result<State, HandlerError> {
            Err(HandlerError::new("gateway unreachable"))
        }

        let handlers: &[(Event, Handler)] = &[
            (Event::Create, handlers::create),
            (Event::Submit, reject),
            (Event::Confirm, handlers::confirm),
            (Event::OrderTimeoutElapsed, handlers::order_timeout),
            (Event::PaymentTimeoutElapsed, handlers::payment_timeout),
        ];
        let table = TransitionTable::build(ELIGIBLE_EVENTS, handlers).unwrap();
        let machine = OrderMachine::from_state(table, State::new(Status::Pending, ""));

        let err = machine
            .call(Event::Submit, [ContextOption::PaymentId("p1".into())])
            .unwrap_err();
        assert!(matches!(
            err,
            MachineError::TransitionFailed { status: Status::Pending, event: Event::Submit, ref reason }
                if reason == "gateway unreachable"
        ));
        assert_eq!(machine.state(), State::new(Status::Pending, ""));
    }

    #[test]
    fn test_confirm_uses_held_payment_id() {
        let machine = machine_at(Status::OrderSubmitted, "p1");
        let state = machine
            .call(Event::Confirm, [ContextOption::PaymentConfirmed(false)])
            .unwrap();
        assert_eq!(state, State::new(Status::PaymentFailed, "p1"));
        assert!(machine.is_finished());
    }

    #[test]
    fn test_state_output_reflects_commit() {
        let machine = machine_at(Status::Pending, "");
        machine
            .call_with(Event::Submit, TransitionContext::new().with_payment_id("p9"))
            .unwrap();
        let output = machine.state_output();
        assert_eq!(output.status, "ORDER_SUBMITTED");
        assert_eq!(output.payment_id, "p9");
    }
}
