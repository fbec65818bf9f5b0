//! Payment service trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SagaError;

/// Remote operations offered by the payment service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentOperation {
    CreateOrderIntent,
    SubmitPayment,
    GetPaymentStatus,
}

impl PaymentOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOperation::CreateOrderIntent => "CreateOrderIntent",
            PaymentOperation::SubmitPayment => "SubmitPayment",
            PaymentOperation::GetPaymentStatus => "GetPaymentStatus",
        }
    }
}

impl std::fmt::Display for PaymentOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer to an order intent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub success: bool,
}

/// Receipt for a submitted payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    /// The payment ID assigned by the payment service.
    pub payment_id: String,
}

/// Reported outcome of a submitted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub success: bool,
}

/// Trait for the remote payment operations a saga depends on.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Asks the provider whether an order may be placed.
    async fn create_order_intent(&self, order_id: OrderId) -> Result<OrderIntent, SagaError>;

    /// Submits payment details for an order.
    async fn submit_payment(
        &self,
        order_id: OrderId,
        payment_info: &str,
    ) -> Result<PaymentSubmission, SagaError>;

    /// Looks up whether a submitted payment went through.
    async fn get_payment_status(&self, payment_id: &str) -> Result<PaymentStatus, SagaError>;
}

#[derive(Debug)]
struct InMemoryPaymentState {
    payments: HashMap<String, (OrderId, String)>,
    decline_order_intent: bool,
    payment_confirmed: bool,
    failing: HashSet<PaymentOperation>,
    latency: HashMap<PaymentOperation, Duration>,
    calls: HashMap<PaymentOperation, usize>,
}

impl Default for InMemoryPaymentState {
    fn default() -> Self {
        Self {
            payments: HashMap::new(),
            decline_order_intent: false,
            payment_confirmed: true,
            failing: HashSet::new(),
            latency: HashMap::new(),
            calls: HashMap::new(),
        }
    }
}

/// In-memory payment service for local runs and tests.
///
/// Every call succeeds by default: order intents are accepted and
/// submitted payments report success.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryPaymentState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryPaymentState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes order intents come back declined.
    pub fn set_decline_order_intent(&self, decline: bool) {
        self.write().decline_order_intent = decline;
    }

    /// Sets the outcome reported by `get_payment_status`.
    pub fn set_payment_confirmed(&self, confirmed: bool) {
        self.write().payment_confirmed = confirmed;
    }

    /// Makes every call to `operation` fail.
    pub fn set_fail_on(&self, operation: PaymentOperation, fail: bool) {
        let mut state = self.write();
        if fail {
            state.failing.insert(operation);
        } else {
            state.failing.remove(&operation);
        }
    }

    /// Delays every call to `operation` before it answers.
    pub fn set_latency(&self, operation: PaymentOperation, latency: Option<Duration>) {
        let mut state = self.write();
        match latency {
            Some(latency) => state.latency.insert(operation, latency),
            None => state.latency.remove(&operation),
        };
    }

    /// Returns how many times `operation` has been invoked.
    pub fn call_count(&self, operation: PaymentOperation) -> usize {
        self.read().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Returns the number of submitted payments.
    pub fn payment_count(&self) -> usize {
        self.read().payments.len()
    }

    /// Returns true if a payment exists with the given ID.
    pub fn has_payment(&self, payment_id: &str) -> bool {
        self.read().payments.contains_key(payment_id)
    }

    /// Records the call, waits out any configured latency, then applies failure injection.
    async fn enter(&self, operation: PaymentOperation) -> Result<(), SagaError> {
        let latency = {
            let mut state = self.write();
            *state.calls.entry(operation).or_default() += 1;
            state.latency.get(&operation).copied()
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.read().failing.contains(&operation) {
            return Err(SagaError::RemoteCall {
                operation,
                reason: "payment service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn create_order_intent(&self, order_id: OrderId) -> Result<OrderIntent, SagaError> {
        self.enter(PaymentOperation::CreateOrderIntent).await?;
        let success = !self.read().decline_order_intent;
        tracing::info!(%order_id, success, "order intent requested");
        Ok(OrderIntent { success })
    }

    async fn submit_payment(
        &self,
        order_id: OrderId,
        payment_info: &str,
    ) -> Result<PaymentSubmission, SagaError> {
        self.enter(PaymentOperation::SubmitPayment).await?;
        let payment_id = Uuid::new_v4().to_string();
        self.write()
            .payments
            .insert(payment_id.clone(), (order_id, payment_info.to_string()));
        tracing::info!(%order_id, %payment_id, "payment submitted");
        Ok(PaymentSubmission { payment_id })
    }

    async fn get_payment_status(&self, payment_id: &str) -> Result<PaymentStatus, SagaError> {
        self.enter(PaymentOperation::GetPaymentStatus).await?;
        let success = self.read().payment_confirmed;
        tracing::info!(%payment_id, success, "payment status checked");
        Ok(PaymentStatus { success })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_and_lookup() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();

        let intent = service.create_order_intent(order_id).await.unwrap();
        assert!(intent.success);

        let submission = service.submit_payment(order_id, "card-4242").await.unwrap();
        assert!(Uuid::parse_str(&submission.payment_id).is_ok());
        assert_eq!(service.payment_count(), 1);
        assert!(service.has_payment(&submission.payment_id));

        let status = service.get_payment_status(&submission.payment_id).await.unwrap();
        assert!(status.success);
    }

    #[tokio::test]
    async fn test_declined_intent() {
        let service = InMemoryPaymentService::new();
        service.set_decline_order_intent(true);

        let intent = service.create_order_intent(OrderId::new()).await.unwrap();
        assert!(!intent.success);
    }

    #[tokio::test]
    async fn test_fail_on_operation() {
        let service = InMemoryPaymentService::new();
        service.set_fail_on(PaymentOperation::SubmitPayment, true);

        let result = service.submit_payment(OrderId::new(), "card").await;
        assert!(matches!(
            result,
            Err(SagaError::RemoteCall { operation: PaymentOperation::SubmitPayment, .. })
        ));
        assert_eq!(service.payment_count(), 0);
        assert_eq!(service.call_count(PaymentOperation::SubmitPayment), 1);

        service.set_fail_on(PaymentOperation::SubmitPayment, false);
        assert!(service.submit_payment(OrderId::new(), "card").await.is_ok());
    }

    #[tokio::test]
    async fn test_unique_payment_ids() {
        let service = InMemoryPaymentService::new();
        let order_id = OrderId::new();

        let r1 = service.submit_payment(order_id, "card").await.unwrap();
        let r2 = service.submit_payment(order_id, "card").await.unwrap();

        assert_ne!(r1.payment_id, r2.payment_id);
        assert_eq!(service.call_count(PaymentOperation::SubmitPayment), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_answer() {
        let service = InMemoryPaymentService::new();
        service.set_latency(PaymentOperation::GetPaymentStatus, Some(Duration::from_secs(3)));

        let start = tokio::time::Instant::now();
        service.get_payment_status("PAY").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
