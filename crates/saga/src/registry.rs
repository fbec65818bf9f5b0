//! Registry of running sagas, addressed by order ID.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::StateOutput;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::coordinator::SagaCoordinator;
use crate::error::SagaError;
use crate::handle::SagaHandle;
use crate::services::PaymentService;
use crate::signals::SignalChannel;

/// Listing entry for one saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SagaSummary {
    pub order_id: OrderId,
    pub workflow_id: String,
    pub status: String,
    pub payment_id: String,
    pub started_at: DateTime<Utc>,
}

/// Starts sagas and routes signals and queries to them.
pub struct SagaRegistry<P>
where
    P: PaymentService,
{
    coordinator: Arc<SagaCoordinator<P>>,
    sagas: RwLock<HashMap<OrderId, SagaHandle>>,
}

impl<P> SagaRegistry<P>
where
    P: PaymentService + 'static,
{
    pub fn new(coordinator: SagaCoordinator<P>) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            sagas: RwLock::new(HashMap::new()),
        }
    }

    pub fn coordinator(&self) -> &SagaCoordinator<P> {
        &self.coordinator
    }

    /// Starts a saga for `order_id`. At most one saga runs per order.
    pub async fn start(&self, order_id: OrderId) -> Result<SagaHandle, SagaError> {
        let mut sagas = self.sagas.write().await;
        if sagas.contains_key(&order_id) {
            return Err(SagaError::AlreadyStarted(order_id));
        }

        let handle = Arc::clone(&self.coordinator).spawn(order_id)?;
        sagas.insert(order_id, handle.clone());
        Ok(handle)
    }

    pub async fn get(&self, order_id: OrderId) -> Result<SagaHandle, SagaError> {
        self.sagas
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(SagaError::UnknownOrder(order_id))
    }

    pub async fn signal(
        &self,
        order_id: OrderId,
        channel: SignalChannel,
        payload: Value,
    ) -> Result<(), SagaError> {
        self.get(order_id).await?.signal(channel, payload)
    }

    /// Answers `getOrderState` for `order_id`.
    pub async fn query(&self, order_id: OrderId) -> Result<StateOutput, SagaError> {
        Ok(self.get(order_id).await?.order_state())
    }

    pub async fn query_named(&self, order_id: OrderId, name: &str) -> Result<StateOutput, SagaError> {
        self.get(order_id).await?.query(name)
    }

    /// Lists every known saga, oldest first.
    pub async fn list(&self) -> Vec<SagaSummary> {
        let sagas = self.sagas.read().await;
        let mut summaries: Vec<SagaSummary> = sagas
            .values()
            .map(|handle| {
                let output = handle.order_state();
                SagaSummary {
                    order_id: handle.order_id(),
                    workflow_id: handle.workflow_id(),
                    status: output.status,
                    payment_id: output.payment_id,
                    started_at: handle.started_at(),
                }
            })
            .collect();
        summaries.sort_by_key(|s| (s.started_at, s.order_id));
        summaries
    }

    pub async fn len(&self) -> usize {
        self.sagas.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sagas.read().await.is_empty()
    }
}
