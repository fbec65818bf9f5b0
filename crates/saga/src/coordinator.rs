//! Saga coordinator driving one order through its payment lifecycle.

use std::future::Future;
use std::sync::Arc;

use common::OrderId;
use domain::{Event, MachineError, OrderMachine, State, TransitionContext};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::{RetryPolicy, SagaConfig};
use crate::error::SagaError;
use crate::handle::{SagaHandle, SagaOutcome};
use crate::services::{PaymentOperation, PaymentService};
use crate::signals::{PaymentResultSignal, SignalChannel, SignalPayload, SubmitPaymentSignal};
use crate::trigger::{Armed, SignalInbox, Trigger, signal_channels};

/// Saga type recorded on every coordinator span.
pub const SAGA_TYPE: &str = "OrderPayment";

/// Orchestrates order payment sagas.
///
/// Each saga requests an order intent, then waits in `PENDING` for a payment
/// submission and in `ORDER_SUBMITTED` for a confirmation, racing signals
/// against deadlines until the order reaches a terminal status. Failures of a
/// single trigger are logged and counted; the saga keeps waiting.
pub struct SagaCoordinator<P>
where
    P: PaymentService,
{
    payment: P,
    config: SagaConfig,
}

impl<P> SagaCoordinator<P>
where
    P: PaymentService,
{
    /// Creates a new saga coordinator.
    pub fn new(payment: P, config: SagaConfig) -> Self {
        Self { payment, config }
    }

    pub fn payment(&self) -> &P {
        &self.payment
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Runs the saga for `order_id` until the machine reaches a terminal status.
    ///
    /// Returns an error only when the initial order intent call fails, in which
    /// case the machine is left in `CREATED`.
    #[tracing::instrument(skip(self, machine, inbox), fields(saga_type = SAGA_TYPE))]
    pub async fn execute(
        &self,
        order_id: OrderId,
        machine: &OrderMachine,
        inbox: &mut SignalInbox,
    ) -> Result<State, SagaError> {
        metrics::counter!("saga_started_total").increment(1);
        let saga_start = Instant::now();

        let intent = self
            .call_remote(PaymentOperation::CreateOrderIntent, || {
                self.payment.create_order_intent(order_id)
            })
            .await?;
        let state = machine.call_with(
            Event::Create,
            TransitionContext::new().with_order_creation_succeeded(intent.success),
        )?;
        metrics::counter!("saga_transitions_total", "event" => Event::Create.as_str())
            .increment(1);
        tracing::info!(status = %state.status, "order intent resolved");

        let mut armed = Armed::arm(machine.status(), &self.config, Instant::now());
        while let Some(mut current) = armed.take() {
            let trigger = inbox.wait_first(&current).await;
            let trigger_name = trigger.name();
            let event = trigger.event();
            let was_poll = trigger == Trigger::PollDue;

            match self.dispatch(order_id, machine, trigger).await {
                Ok(state) => {
                    metrics::counter!("saga_transitions_total", "event" => event.as_str())
                        .increment(1);
                    tracing::info!(trigger = trigger_name, status = %state.status, "transition applied");
                }
                Err(err) => record_rejection(trigger_name, &err),
            }

            let status = machine.status();
            armed = if status != current.status() {
                Armed::arm(status, &self.config, Instant::now())
            } else {
                if was_poll {
                    current.rearm_poll(Instant::now());
                }
                Some(current)
            };
        }

        let state = machine.state();
        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("saga_finished_total", "status" => state.status.as_str()).increment(1);
        tracing::info!(status = %state.status, payment_id = %state.payment_id, "saga finished");
        Ok(state)
    }

    /// Turns a fired trigger into a transition.
    ///
    /// Triggers the current status no longer accepts are rejected before any
    /// remote call is made.
    async fn dispatch(
        &self,
        order_id: OrderId,
        machine: &OrderMachine,
        trigger: Trigger,
    ) -> Result<State, SagaError> {
        let event = trigger.event();
        if !machine.can_handle(event) {
            return Err(MachineError::UnhandledEvent {
                status: machine.status(),
                event,
            }
            .into());
        }

        let ctx = match trigger {
            Trigger::Signal(SignalChannel::SubmitPayment, raw) => {
                let signal = SubmitPaymentSignal::decode(raw)?;
                let submission = self
                    .call_remote(PaymentOperation::SubmitPayment, || {
                        self.payment.submit_payment(order_id, &signal.payment_info)
                    })
                    .await?;
                TransitionContext::new().with_payment_id(submission.payment_id)
            }
            Trigger::Signal(SignalChannel::PaymentResult, raw) => {
                let signal = PaymentResultSignal::decode(raw)?;
                TransitionContext::new().with_payment_confirmed(signal.success)
            }
            Trigger::PollDue => {
                let payment_id = machine.state().payment_id;
                let status = self
                    .call_remote(PaymentOperation::GetPaymentStatus, || {
                        self.payment.get_payment_status(&payment_id)
                    })
                    .await?;
                TransitionContext::new().with_payment_confirmed(status.success)
            }
            Trigger::OrderDeadline | Trigger::PaymentDeadline => TransitionContext::new(),
        };

        Ok(machine.call_with(event, ctx)?)
    }

    /// Calls the payment service under the configured timeout and retry policy.
    async fn call_remote<T, F, Fut>(
        &self,
        operation: PaymentOperation,
        mut call: F,
    ) -> Result<T, SagaError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SagaError>>,
    {
        let RetryPolicy { attempts, backoff } = self.config.retry;
        let timeout = self.config.call_timeout;
        let mut attempt: u8 = 1;

        loop {
            let result = match tokio::time::timeout(timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(SagaError::RemoteTimeout { operation, timeout }),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts.get() => {
                    tracing::warn!(%operation, attempt, error = %err, "remote call failed, retrying");
                    if let Some(backoff) = backoff {
                        tokio::time::sleep(backoff).await;
                    }
                    attempt += 1;
                }
                Err(err) => {
                    metrics::counter!(
                        "saga_remote_call_failures_total",
                        "operation" => operation.as_str()
                    )
                    .increment(1);
                    return Err(err);
                }
            }
        }
    }
}

impl<P> SagaCoordinator<P>
where
    P: PaymentService + 'static,
{
    /// Starts a saga for `order_id` on the current runtime.
    ///
    /// Once the saga stops, its signal inbox is closed and any signals still
    /// queued are logged and dropped.
    pub fn spawn(self: Arc<Self>, order_id: OrderId) -> Result<SagaHandle, SagaError> {
        let machine = Arc::new(OrderMachine::new()?);
        let (signals, mut inbox) = signal_channels();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let handle = SagaHandle::new(order_id, Arc::clone(&machine), signals, outcome_rx);

        tokio::spawn(async move {
            let result = self.execute(order_id, &machine, &mut inbox).await;

            for (channel, payload) in inbox.close_and_drain() {
                metrics::counter!("saga_signals_rejected_total", "channel" => channel.name())
                    .increment(1);
                tracing::warn!(%order_id, %channel, %payload, "signal dropped, saga finished");
            }

            let outcome = match result {
                Ok(state) => SagaOutcome::Completed(state),
                Err(err) => {
                    metrics::counter!("saga_aborted_total").increment(1);
                    tracing::error!(%order_id, error = %err, "saga aborted");
                    SagaOutcome::Aborted {
                        state: machine.state(),
                        reason: err.to_string(),
                    }
                }
            };
            outcome_tx.send_replace(Some(outcome));
        });

        tracing::info!(%order_id, workflow_id = %order_id.workflow_id(), "saga started");
        Ok(handle)
    }
}

fn record_rejection(trigger: &'static str, err: &SagaError) {
    match err {
        SagaError::Machine(MachineError::UnhandledEvent { .. }) => {
            tracing::warn!(trigger, error = %err, "trigger no longer eligible");
        }
        SagaError::Decode { channel, .. } => {
            metrics::counter!("saga_signals_rejected_total", "channel" => channel.name())
                .increment(1);
            tracing::warn!(trigger, error = %err, "signal payload rejected");
        }
        _ => {
            tracing::warn!(trigger, error = %err, "trigger failed, still waiting");
        }
    }
}
