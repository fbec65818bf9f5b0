use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    ContextOption, Event, OrderMachine, State, Status, TransitionContext, TransitionTable,
};

fn bench_build_table(c: &mut Criterion) {
    c.bench_function("domain/build_table", |b| {
        b.iter(|| TransitionTable::standard().unwrap());
    });
}

fn bench_happy_path(c: &mut Criterion) {
    c.bench_function("domain/create_submit_confirm", |b| {
        b.iter(|| {
            let machine = OrderMachine::new().unwrap();
            machine
                .call(Event::Create, [ContextOption::OrderCreationSucceeded(true)])
                .unwrap();
            machine
                .call(Event::Submit, [ContextOption::PaymentId("p1".to_string())])
                .unwrap();
            machine
                .call(Event::Confirm, [ContextOption::PaymentConfirmed(true)])
                .unwrap();
        });
    });
}

fn bench_rejected_event(c: &mut Criterion) {
    let machine = OrderMachine::from_state(
        TransitionTable::standard().unwrap(),
        State::new(Status::PaymentSuccess, "p1"),
    );

    c.bench_function("domain/unhandled_event", |b| {
        b.iter(|| machine
                .call_with(Event::Submit, TransitionContext::new())
                .unwrap_err());
    });
}

fn bench_query(c: &mut Criterion) {
    let machine = OrderMachine::new().unwrap();

    c.bench_function("domain/state_output", |b| {
        b.iter(|| machine.state_output());
    });
}

criterion_group!(
    benches,
    bench_build_table,
    bench_happy_path,
    bench_rejected_event,
    bench_query
);
criterion_main!(benches);
