//! Behavioural properties of the order machine.
//!
//! These tests walk every reachable status, check the eligibility contract,
//! and verify that concurrent callers are serialized.

use std::sync::Arc;
use std::thread;

use domain::{
    ContextOption, Event, MachineError, OrderMachine, State, Status, TransitionContext,
    TransitionTable,
};

fn machine_at(status: Status) -> OrderMachine {
    OrderMachine::from_state(
        TransitionTable::standard().unwrap(),
        State::new(status, "p0"),
    )
}

fn context_for(event: Event) -> TransitionContext {
    match event {
        Event::Create => TransitionContext::new().with_order_creation_succeeded(true),
        Event::Submit => TransitionContext::new().with_payment_id("p1"),
        Event::Confirm => TransitionContext::new().with_payment_confirmed(true),
        Event::OrderTimeoutElapsed | Event::PaymentTimeoutElapsed => TransitionContext::new(),
    }
}

mod eligibility {
    use super::*;

    #[test]
    fn call_succeeds_iff_event_is_eligible() {
        let table = TransitionTable::standard().unwrap();

        for status in Status::ALL {
            for event in Event::ALL {
                let machine = machine_at(status);
                let result = machine.call_with(event, context_for(event));

                if table.is_eligible(status, event) {
                    assert!(result.is_ok(), "{status} should accept {event}");
                } else {
                    assert_eq!(
                        result.unwrap_err(),
                        MachineError::UnhandledEvent { status, event },
                    );
                    assert_eq!(machine.state(), State::new(status, "p0"));
                }
            }
        }
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        for status in Status::ALL.into_iter().filter(Status::is_terminal) {
            let machine = machine_at(status);
            assert!(machine.is_finished());
            assert!(machine.eligible_events().is_empty());
        }
    }
}

mod scenarios {
    use super::*;

    #[test]
    fn happy_path() {
        let machine = OrderMachine::new().unwrap();

        let state = machine
            .call(Event::Create, [ContextOption::OrderCreationSucceeded(true)])
            .unwrap();
        assert_eq!(state.status, Status::Pending);

        let state = machine
            .call(Event::Submit, [ContextOption::PaymentId("p1".into())])
            .unwrap();
        assert_eq!(state, State::new(Status::OrderSubmitted, "p1"));

        let state = machine
            .call(Event::Confirm, [ContextOption::PaymentConfirmed(true)])
            .unwrap();
        assert_eq!(state, State::new(Status::PaymentSuccess, "p1"));
        assert!(machine.eligible_events().is_empty());
    }

    #[test]
    fn order_creation_failure_is_terminal() {
        let machine = OrderMachine::new().unwrap();
        let state = machine
            .call(Event::Create, [ContextOption::OrderCreationSucceeded(false)])
            .unwrap();
        assert_eq!(state.status, Status::Failed);
        assert!(machine.is_finished());
    }

    #[test]
    fn order_timeout_from_pending() {
        let machine = OrderMachine::new().unwrap();
        machine
            .call(Event::Create, [ContextOption::OrderCreationSucceeded(true)])
            .unwrap();
        let state = machine
            .call_with(Event::OrderTimeoutElapsed, TransitionContext::new())
            .unwrap();
        assert_eq!(state.status, Status::OrderTimeout);
        assert!(machine.is_finished());
    }

    #[test]
    fn payment_timeout_wins_over_later_confirmation() {
        let machine = machine_at(Status::OrderSubmitted);
        let state = machine
            .call_with(Event::PaymentTimeoutElapsed, TransitionContext::new())
            .unwrap();
        assert_eq!(state, State::new(Status::PaymentTimeout, "p0"));

        let late = machine.call(Event::Confirm, [ContextOption::PaymentConfirmed(true)]);
        assert!(matches!(late, Err(MachineError::UnhandledEvent { .. })));
        assert_eq!(machine.status(), Status::PaymentTimeout);
    }

    #[test]
    fn repeated_reads_are_identical() {
        let machine = machine_at(Status::OrderSubmitted);
        let first = machine.state_output();
        let second = machine.state_output();
        assert_eq!(first, second);
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn concurrent_calls_have_exactly_one_winner() {
        const CALLERS: usize = 16;

        let machine = Arc::new(machine_at(Status::Pending));

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|i| {
                    let machine = Arc::clone(&machine);
                    scope.spawn(move || {
                        machine.call(Event::Submit, [ContextOption::PaymentId(format!("p{i}"))])
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);

        let losers = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(MachineError::UnhandledEvent {
                        status: Status::OrderSubmitted,
                        event: Event::Submit
                    })
                )
            })
            .count();
        assert_eq!(losers, CALLERS - 1);

        assert_eq!(machine.state(), *winners[0]);
    }

    #[test]
    fn readers_only_see_committed_states() {
        let machine = Arc::new(OrderMachine::new().unwrap());
        let allowed = [
            State::new(Status::Created, ""),
            State::new(Status::Pending, ""),
            State::new(Status::OrderSubmitted, "p1"),
            State::new(Status::PaymentSuccess, "p1"),
        ];

        thread::scope(|scope| {
            let reader = {
                let machine = Arc::clone(&machine);
                scope.spawn(move || {
                    for _ in 0..1_000 {
                        let seen = machine.state();
                        assert!(allowed.contains(&seen), "torn read: {seen:?}");
                    }
                })
            };

            machine
                .call(Event::Create, [ContextOption::OrderCreationSucceeded(true)])
                .unwrap();
            machine
                .call(Event::Submit, [ContextOption::PaymentId("p1".into())])
                .unwrap();
            machine
                .call(Event::Confirm, [ContextOption::PaymentConfirmed(true)])
                .unwrap();

            reader.join().unwrap();
        });
    }
}
