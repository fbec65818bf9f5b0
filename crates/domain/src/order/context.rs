//! Inputs supplied alongside an event.

/// A single named input for a transition.
///
/// Options are applied in order, so a later option overrides an earlier one
/// that sets the same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextOption {
    /// Whether the order-intent call succeeded.
    OrderCreationSucceeded(bool),
    /// Whether the payment was confirmed.
    PaymentConfirmed(bool),
    /// Payment identifier returned by the payment service.
    PaymentId(String),
}

/// Transition inputs. A field left as `None` is not applicable to the event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionContext {
    order_creation_succeeded: Option<bool>,
    payment_confirmed: Option<bool>,
    payment_id: Option<String>,
}

impl TransitionContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a single option, overriding any previous value for its field.
    pub fn apply(&mut self, option: ContextOption) {
        match option {
            ContextOption::OrderCreationSucceeded(v) => self.order_creation_succeeded = Some(v),
            ContextOption::PaymentConfirmed(v) => self.payment_confirmed = Some(v),
            ContextOption::PaymentId(v) => self.payment_id = Some(v),
        }
    }

    pub fn with_order_creation_succeeded(mut self, succeeded: bool) -> Self {
        self.apply(ContextOption::OrderCreationSucceeded(succeeded));
        self
    }

    pub fn with_payment_confirmed(mut self, confirmed: bool) -> Self {
        self.apply(ContextOption::PaymentConfirmed(confirmed));
        self
    }

    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.apply(ContextOption::PaymentId(payment_id.into()));
        self
    }

    pub fn order_creation_succeeded(&self) -> Option<bool> {
        self.order_creation_succeeded
    }

    pub fn payment_confirmed(&self) -> Option<bool> {
        self.payment_confirmed
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }
}

impl FromIterator<ContextOption> for TransitionContext {
    fn from_iter<I: IntoIterator<Item = ContextOption>>(iter: I) -> Self {
        let mut ctx = TransitionContext::new();
        for option in iter {
            ctx.apply(option);
        }
        ctx
    }
}
