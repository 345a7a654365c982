//! HTTP surface of the booking service.
//!
//! Handlers only parse requests, call [`BookingService`] and render its
//! outcomes. Error bodies are `{"detail": "..."}`.

use crate::core::booking::{BookingService, FailureKind, OperationFailure};
use crate::core::PassengerDetails;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

pub type AppState = Arc<BookingService>;

impl IntoResponse for OperationFailure {
    fn into_response(self) -> Response {
        let status = match self.kind {
            FailureKind::ClientError => StatusCode::BAD_REQUEST,
            FailureKind::NotFound => StatusCode::NOT_FOUND,
            FailureKind::ServerError if self.cause.is_retryable() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            FailureKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/flights", get(list_flights))
        .route(
            "/flights/:flight_id/passengers",
            get(list_passengers).post(add_passenger),
        )
        .route(
            "/flights/:flight_id/passengers/:customer_id",
            put(update_passenger).delete(delete_passenger),
        )
        .with_state(service)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_flights(State(service): State<AppState>) -> Response {
    Json(json!({ "flights": service.list_flights() })).into_response()
}

async fn list_passengers(
    State(service): State<AppState>,
    Path(flight_id): Path<String>,
) -> Response {
    match service.list_passengers(&flight_id) {
        Ok(passengers) => Json(json!({ "passengers": passengers })).into_response(),
        Err(failure) => failure.into_response(),
    }
}

async fn add_passenger(
    State(service): State<AppState>,
    Path(flight_id): Path<String>,
    Json(details): Json<PassengerDetails>,
) -> Response {
    match service.add_passenger(&flight_id, details).await {
        Ok(passenger) => Json(passenger).into_response(),
        Err(failure) => failure.into_response(),
    }
}

async fn update_passenger(
    State(service): State<AppState>,
    Path((flight_id, customer_id)): Path<(String, u64)>,
    Json(details): Json<PassengerDetails>,
) -> Response {
    match service
        .update_passenger(&flight_id, customer_id, details)
        .await
    {
        Ok(passenger) => Json(passenger).into_response(),
        Err(failure) => failure.into_response(),
    }
}

async fn delete_passenger(
    State(service): State<AppState>,
    Path((flight_id, customer_id)): Path<(String, u64)>,
) -> Response {
    match service.delete_passenger(&flight_id, customer_id).await {
        Ok(outcome) => Json(json!({
            "flight_id": flight_id,
            "customer_id": customer_id,
            "removed": outcome.removed(),
        }))
        .into_response(),
        Err(failure) => failure.into_response(),
    }
}
