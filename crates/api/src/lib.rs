//! HTTP API server hosting order payment sagas.
//!
//! Provides REST endpoints to start sagas, query their state and deliver
//! signals, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{InMemoryPaymentService, PaymentService, SagaConfig, SagaCoordinator, SagaRegistry};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<P: PaymentService + 'static>(
    state: Arc<AppState<P>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<P>))
        .route("/orders", get(routes::orders::list::<P>))
        .route("/orders/{id}", get(routes::orders::get::<P>))
        .route("/orders/{id}/payment", post(routes::orders::submit_payment::<P>))
        .route(
            "/orders/{id}/payment-result",
            post(routes::orders::payment_result::<P>),
        )
        .route(
            "/orders/{id}/signals/{channel}",
            post(routes::orders::signal::<P>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state backed by the in-memory payment service.
pub fn create_default_state(config: SagaConfig) -> Arc<AppState<InMemoryPaymentService>> {
    let payment = InMemoryPaymentService::new();
    let coordinator = SagaCoordinator::new(payment, config);

    Arc::new(AppState {
        registry: SagaRegistry::new(coordinator),
    })
}
