//! Waiting for whichever eligible trigger fires first.
//!
//! A saga in a waiting status races the signal channels that status accepts
//! against its deadlines. Deadlines are armed once on entering a status and
//! survive loop iterations that leave the status unchanged. The payment
//! status poll is re-armed after each poll that fails to move the saga.

use std::time::Duration;

use domain::{Event, Status};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::config::SagaConfig;
use crate::signals::SignalChannel;

/// The trigger that won a race.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// A raw payload arrived on a signal channel.
    Signal(SignalChannel, Value),
    /// The payment status poll is due.
    PollDue,
    /// The order timeout elapsed.
    OrderDeadline,
    /// The payment timeout elapsed.
    PaymentDeadline,
}

impl Trigger {
    /// Returns the FSM event this trigger drives.
    pub fn event(&self) -> Event {
        match self {
            Trigger::Signal(SignalChannel::SubmitPayment, _) => Event::Submit,
            Trigger::Signal(SignalChannel::PaymentResult, _) | Trigger::PollDue => Event::Confirm,
            Trigger::OrderDeadline => Event::OrderTimeoutElapsed,
            Trigger::PaymentDeadline => Event::PaymentTimeoutElapsed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::Signal(channel, _) => channel.name(),
            Trigger::PollDue => "poll",
            Trigger::OrderDeadline => "orderTimeout",
            Trigger::PaymentDeadline => "paymentTimeout",
        }
    }
}

/// Triggers armed for one waiting status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Armed {
    status: Status,
    channels: &'static [SignalChannel],
    order_deadline: Option<Instant>,
    payment_deadline: Option<Instant>,
    poll_at: Option<Instant>,
    poll_interval: Duration,
}

impl Armed {
    /// Arms the triggers of `status`, or returns `None` when it waits on nothing.
    pub fn arm(status: Status, config: &SagaConfig, now: Instant) -> Option<Self> {
        match status {
            Status::Pending => Some(Self {
                status,
                channels: &[SignalChannel::SubmitPayment],
                order_deadline: Some(now + config.order_timeout),
                payment_deadline: None,
                poll_at: None,
                poll_interval: config.poll_interval,
            }),
            Status::OrderSubmitted => Some(Self {
                status,
                channels: &[SignalChannel::PaymentResult],
                order_deadline: None,
                payment_deadline: Some(now + config.payment_timeout),
                poll_at: Some(now + config.poll_interval),
                poll_interval: config.poll_interval,
            }),
            _ => None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn accepts(&self, channel: SignalChannel) -> bool {
        self.channels.contains(&channel)
    }

    pub fn order_deadline(&self) -> Option<Instant> {
        self.order_deadline
    }

    pub fn payment_deadline(&self) -> Option<Instant> {
        self.payment_deadline
    }

    pub fn poll_at(&self) -> Option<Instant> {
        self.poll_at
    }

    /// Schedules the next poll one interval after `now`.
    pub fn rearm_poll(&mut self, now: Instant) {
        if self.poll_at.is_some() {
            self.poll_at = Some(now + self.poll_interval);
        }
    }
}

/// Sending half of one saga's signal channels.
#[derive(Debug, Clone)]
pub struct SignalSender {
    submit_payment: mpsc::UnboundedSender<Value>,
    payment_result: mpsc::UnboundedSender<Value>,
}

impl SignalSender {
    /// Queues a raw payload. Hands the payload back once the inbox is closed.
    pub fn send(&self, channel: SignalChannel, payload: Value) -> Result<(), Value> {
        let sender = match channel {
            SignalChannel::SubmitPayment => &self.submit_payment,
            SignalChannel::PaymentResult => &self.payment_result,
        };
        sender.send(payload).map_err(|err| err.0)
    }

    pub fn is_closed(&self) -> bool {
        self.submit_payment.is_closed()
    }
}

/// Receiving half of one saga's signal channels.
///
/// Payloads on a channel the current status does not accept stay queued.
#[derive(Debug)]
pub struct SignalInbox {
    submit_payment: mpsc::UnboundedReceiver<Value>,
    payment_result: mpsc::UnboundedReceiver<Value>,
    submit_open: bool,
    result_open: bool,
}

/// Creates the signal channels of one saga instance.
pub fn signal_channels() -> (SignalSender, SignalInbox) {
    let (submit_tx, submit_rx) = mpsc::unbounded_channel();
    let (result_tx, result_rx) = mpsc::unbounded_channel();
    (
        SignalSender {
            submit_payment: submit_tx,
            payment_result: result_tx,
        },
        SignalInbox {
            submit_payment: submit_rx,
            payment_result: result_rx,
            submit_open: true,
            result_open: true,
        },
    )
}

enum Fired {
    Signal(SignalChannel, Option<Value>),
    Poll,
    OrderDeadline,
    PaymentDeadline,
}

async fn sleep_until_armed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl SignalInbox {
    /// Blocks until the first trigger armed in `armed` fires.
    ///
    /// Deadlines that have already passed fire immediately. A channel whose
    /// senders are all gone is disabled instead of firing.
    pub async fn wait_first(&mut self, armed: &Armed) -> Trigger {
        loop {
            let submit_enabled = self.submit_open && armed.accepts(SignalChannel::SubmitPayment);
            let result_enabled = self.result_open && armed.accepts(SignalChannel::PaymentResult);

            let fired = tokio::select! {
                payload = self.submit_payment.recv(), if submit_enabled => {
                    Fired::Signal(SignalChannel::SubmitPayment, payload)
                }
                payload = self.payment_result.recv(), if result_enabled => {
                    Fired::Signal(SignalChannel::PaymentResult, payload)
                }
                () = sleep_until_armed(armed.order_deadline) => Fired::OrderDeadline,
                () = sleep_until_armed(armed.payment_deadline) => Fired::PaymentDeadline,
                () = sleep_until_armed(armed.poll_at) => Fired::Poll,
            };

            match fired {
                Fired::Signal(channel, Some(payload)) => return Trigger::Signal(channel, payload),
                Fired::Signal(SignalChannel::SubmitPayment, None) => self.submit_open = false,
                Fired::Signal(SignalChannel::PaymentResult, None) => self.result_open = false,
                Fired::Poll => return Trigger::PollDue,
                Fired::OrderDeadline => return Trigger::OrderDeadline,
                Fired::PaymentDeadline => return Trigger::PaymentDeadline,
            }
        }
    }

    /// Stops accepting signals and returns whatever was still queued.
    pub fn close_and_drain(&mut self) -> Vec<(SignalChannel, Value)> {
        self.submit_payment.close();
        self.payment_result.close();
        self.submit_open = false;
        self.result_open = false;

        let mut dropped = Vec::new();
        while let Ok(payload) = self.submit_payment.try_recv() {
            dropped.push((SignalChannel::SubmitPayment, payload));
        }
        while let Ok(payload) = self.payment_result.try_recv() {
            dropped.push((SignalChannel::PaymentResult, payload));
        }
        dropped
    }
}
