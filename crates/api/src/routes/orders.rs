//! Order saga endpoints: start, query, list and signal.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::OrderId;
use saga::{
    PaymentResultSignal, PaymentService, QUERY_ORDER_STATE, SagaRegistry, SignalChannel,
    SignalPayload, SubmitPaymentSignal,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<P: PaymentService> {
    pub registry: SagaRegistry<P>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub workflow_id: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct OrderStateResponse {
    pub order_id: String,
    pub status: String,
    pub payment_id: String,
}

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub order_id: String,
    pub status: String,
    pub payment_id: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct SignalAcceptedResponse {
    pub order_id: String,
    pub channel: &'static str,
}

// -- Handlers --

/// POST /orders: start a saga for a fresh order.
#[tracing::instrument(skip(state))]
pub async fn create<P: PaymentService + 'static>(
    State(state): State<Arc<AppState<P>>>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let handle = state.registry.start(OrderId::new()).await?;

    let response = OrderCreatedResponse {
        order_id: handle.order_id().to_string(),
        workflow_id: handle.workflow_id(),
        status: handle.order_state().status,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders/{id}: answer `getOrderState` for an order.
#[tracing::instrument(skip(state))]
pub async fn get<P: PaymentService + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderStateResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let output = state
        .registry
        .query_named(order_id, QUERY_ORDER_STATE)
        .await?;

    Ok(Json(OrderStateResponse {
        order_id: order_id.to_string(),
        status: output.status,
        payment_id: output.payment_id,
    }))
}

/// GET /orders: list every saga, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<P: PaymentService + 'static>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<Vec<OrderSummaryResponse>> {
    let responses = state
        .registry
        .list()
        .await
        .into_iter()
        .map(|s| OrderSummaryResponse {
            order_id: s.order_id.to_string(),
            status: s.status,
            payment_id: s.payment_id,
            started_at: s.started_at,
        })
        .collect();

    Json(responses)
}

/// POST /orders/{id}/payment: deliver `submitPayment`.
#[tracing::instrument(skip(state, body))]
pub async fn submit_payment<P: PaymentService + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<SignalAcceptedResponse>), ApiError> {
    SubmitPaymentSignal::decode(body.clone())?;
    deliver(&state, &id, SubmitPaymentSignal::CHANNEL, body).await
}

/// POST /orders/{id}/payment-result: deliver `paymentResult`.
#[tracing::instrument(skip(state, body))]
pub async fn payment_result<P: PaymentService + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<SignalAcceptedResponse>), ApiError> {
    PaymentResultSignal::decode(body.clone())?;
    deliver(&state, &id, PaymentResultSignal::CHANNEL, body).await
}

/// POST /orders/{id}/signals/{channel}: deliver a raw payload to a named channel.
///
/// The payload is only validated by the saga once the channel is eligible.
#[tracing::instrument(skip(state, body))]
pub async fn signal<P: PaymentService + 'static>(
    State(state): State<Arc<AppState<P>>>,
    Path((id, channel)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<SignalAcceptedResponse>), ApiError> {
    let channel = SignalChannel::from_name(&channel)?;
    deliver(&state, &id, channel, body).await
}

async fn deliver<P: PaymentService + 'static>(
    state: &AppState<P>,
    id: &str,
    channel: SignalChannel,
    payload: Value,
) -> Result<(StatusCode, Json<SignalAcceptedResponse>), ApiError> {
    let order_id = parse_order_id(id)?;
    if let Err(err) = state.registry.signal(order_id, channel, payload).await {
        metrics::counter!("http_signals_rejected_total", "channel" => channel.name())
            .increment(1);
        return Err(err.into());
    }
    metrics::counter!("http_signals_accepted_total", "channel" => channel.name()).increment(1);

    Ok((
        StatusCode::ACCEPTED,
        Json(SignalAcceptedResponse {
            order_id: order_id.to_string(),
            channel: channel.name(),
        }),
    ))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse::<OrderId>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}
