//! Client-side handle to a running saga.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{OrderMachine, State, StateOutput, Status};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::SagaError;
use crate::signals::{
    PaymentResultSignal, QUERY_ORDER_STATE, SignalChannel, SignalPayload, SubmitPaymentSignal,
};
use crate::trigger::SignalSender;

/// How a saga stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
    /// The order reached a terminal status.
    Completed(State),
    /// The saga stopped before reaching a terminal status.
    Aborted { state: State, reason: String },
}

impl SagaOutcome {
    /// Returns the order state at the moment the saga stopped.
    pub fn state(&self) -> &State {
        match self {
            SagaOutcome::Completed(state) | SagaOutcome::Aborted { state, .. } => state,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SagaOutcome::Completed(_))
    }
}

/// Handle for signalling, querying and awaiting one saga instance.
///
/// Cloning the handle is cheap; every clone addresses the same saga.
#[derive(Debug, Clone)]
pub struct SagaHandle {
    order_id: OrderId,
    started_at: DateTime<Utc>,
    machine: Arc<OrderMachine>,
    signals: SignalSender,
    outcome: watch::Receiver<Option<SagaOutcome>>,
}

impl SagaHandle {
    pub(crate) fn new(
        order_id: OrderId,
        machine: Arc<OrderMachine>,
        signals: SignalSender,
        outcome: watch::Receiver<Option<SagaOutcome>>,
    ) -> Self {
        Self {
            order_id,
            started_at: Utc::now(),
            machine,
            signals,
            outcome,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn workflow_id(&self) -> String {
        self.order_id.workflow_id()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the current order state. Never blocks on the saga.
    pub fn order_state(&self) -> StateOutput {
        self.machine.state_output()
    }

    pub fn status(&self) -> Status {
        self.machine.status()
    }

    /// Answers a query by name.
    pub fn query(&self, name: &str) -> Result<StateOutput, SagaError> {
        if name == QUERY_ORDER_STATE {
            Ok(self.order_state())
        } else {
            Err(SagaError::UnknownQuery(name.to_string()))
        }
    }

    /// Returns true once the saga no longer accepts signals.
    pub fn is_finished(&self) -> bool {
        self.machine.is_finished() || self.outcome.borrow().is_some()
    }

    /// Delivers a raw payload to a signal channel.
    ///
    /// The payload is validated by the saga when its channel becomes
    /// eligible, not here.
    pub fn signal(&self, channel: SignalChannel, payload: Value) -> Result<(), SagaError> {
        if self.is_finished() || self.signals.send(channel, payload).is_err() {
            metrics::counter!("saga_signals_rejected_total", "channel" => channel.name())
                .increment(1);
            return Err(SagaError::SagaFinished {
                order_id: self.order_id,
                status: self.machine.status(),
            });
        }
        tracing::debug!(order_id = %self.order_id, %channel, "signal queued");
        Ok(())
    }

    /// Delivers a raw payload to the channel registered under `name`.
    pub fn signal_named(&self, name: &str, payload: Value) -> Result<(), SagaError> {
        self.signal(SignalChannel::from_name(name)?, payload)
    }

    pub fn submit_payment(&self, payment_info: impl Into<String>) -> Result<(), SagaError> {
        let signal = SubmitPaymentSignal {
            payment_info: payment_info.into(),
        };
        self.signal(SubmitPaymentSignal::CHANNEL, signal.encode()?)
    }

    pub fn payment_result(&self, success: bool) -> Result<(), SagaError> {
        let signal = PaymentResultSignal { success };
        self.signal(PaymentResultSignal::CHANNEL, signal.encode()?)
    }

    /// Waits until the saga stops.
    pub async fn wait(&self) -> SagaOutcome {
        let mut outcome = self.outcome.clone();
        let reported = outcome
            .wait_for(Option::is_some)
            .await
            .map(|ready| ready.clone());

        match reported {
            Ok(Some(outcome)) => outcome,
            _ => SagaOutcome::Aborted {
                state: self.machine.state(),
                reason: "saga task stopped without reporting an outcome".to_string(),
            },
        }
    }
}
