//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Saga error.
    Saga(SagaError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let finished = match &self {
            ApiError::Saga(SagaError::SagaFinished { order_id, status }) => {
                Some((order_id.to_string(), status.as_str()))
            }
            _ => None,
        };

        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
        };

        let mut body = serde_json::json!({ "error": message });
        if let Some((order_id, saga_status)) = finished {
            body["order_id"] = serde_json::Value::from(order_id);
            body["status"] = serde_json::Value::from(saga_status);
        }
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::UnknownOrder(_) | SagaError::UnknownChannel(_) | SagaError::UnknownQuery(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        SagaError::AlreadyStarted(_) | SagaError::SagaFinished { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        SagaError::Decode { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use common::OrderId;
    use domain::Status;

    use super::*;

    #[tokio::test]
    async fn test_finished_saga_reports_status() {
        let order_id = OrderId::new();
        let response = ApiError::from(SagaError::SagaFinished {
            order_id,
            status: Status::PaymentTimeout,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "PAYMENT_TIMEOUT");
        assert_eq!(json["order_id"], order_id.to_string());
        assert!(json["error"].as_str().unwrap().contains("PAYMENT_TIMEOUT"));
    }

    #[tokio::test]
    async fn test_other_errors_carry_only_message() {
        let response = ApiError::BadRequest("invalid order id: x".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "invalid order id: x" }));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SagaError::UnknownOrder(OrderId::new()), StatusCode::NOT_FOUND),
            (SagaError::UnknownChannel("cancel".into()), StatusCode::NOT_FOUND),
            (SagaError::AlreadyStarted(OrderId::new()), StatusCode::CONFLICT),
            (
                SagaError::SagaFinished {
                    order_id: OrderId::new(),
                    status: Status::OrderTimeout,
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
