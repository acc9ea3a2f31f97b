//! Table reservation HTTP microservice.
//!
//! # Endpoints
//!
//! - `POST /reservations` - Book a table for a time slot
//! - `GET /reservations` - List bookings (`tableNumber` / `date` filters)
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live` - Kubernetes liveness probe
//! - `GET /health/ready` - Kubernetes readiness probe
//!
//! Anything else is answered with a `/problems/route-not-found` document.

mod models;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use tablebook_lib::{Cancellation, CreateReservationRequest, ErrorKind};
use tablebook_service_shared::{
    from_booking_error, health_live, health_ready, metrics_handler, record_reservation_committed,
    record_reservation_rejected, record_reservations_listed, AppState, MetricsConfig,
    MetricsLayer, ProblemDetails, RequestId, ServiceResponse,
};

pub use models::{CreatedReservationDto, ListQuery, ReservationListDto};

/// Resource path for bookings.
pub const RESERVATIONS_PATH: &str = "/reservations";

/// HTTP response - either success or RFC 9457 error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Created(ServiceResponse<CreatedReservationDto>),
    Listed(ServiceResponse<ReservationListDto>),
    Error(ProblemDetails),
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::Created(data) => (StatusCode::OK, Json(data)).into_response(),
            Response::Listed(data) => (StatusCode::OK, Json(data)).into_response(),
            Response::Error(problem) => problem.into_response(),
        }
    }
}

/// Build the service router with the default metrics path.
pub fn router(state: AppState) -> Router {
    router_with_metrics(state, &MetricsConfig::default())
}

/// Build the service router; the metrics route follows `metrics`.
pub fn router_with_metrics(state: AppState, metrics: &MetricsConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    let mut router = Router::new()
        .route(
            RESERVATIONS_PATH,
            get(list_reservations)
                .post(create_reservation)
                .fallback(route_not_found),
        )
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready));

    if metrics.enabled {
        if metrics.path.starts_with('/') {
            router = router.route(&metrics.path, get(metrics_handler));
        } else {
            warn!(path = %metrics.path, "metrics path must start with '/', endpoint disabled");
        }
    }

    router
        .fallback(route_not_found)
        .layer(cors)
        .layer(MetricsLayer)
        .with_state(state)
}

/// Dropped with the handler future when the client goes away, so a booking
/// that has not reached its commit yet is abandoned.
struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Handle POST /reservations.
async fn create_reservation(
    State(state): State<AppState>,
    request_id: RequestId,
    body: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Response {
    let booking = match body {
        Ok(Json(booking)) => booking,
        Err(rejection) => {
            warn!(request_id = %request_id, error = %rejection, "unreadable booking body");
            record_reservation_rejected(ErrorKind::Validation);
            return Response::Error(ProblemDetails::bad_request(
                rejection.body_text(),
                request_id.as_str(),
            ));
        }
    };

    info!(
        request_id = %request_id,
        table_number = ?booking.table_number,
        date = ?booking.date,
        "handling booking request"
    );

    let cancellation = Cancellation::new();
    let _guard = CancelOnDrop(cancellation.clone());
    let coordinator = state.coordinator_arc();
    let outcome = tokio::task::spawn_blocking(move || {
        coordinator.create_reservation(&booking, &cancellation)
    })
    .await;

    match outcome {
        Ok(Ok(id)) => {
            record_reservation_committed();
            info!(request_id = %request_id, reservation_id = %id, "reservation created");
            Response::Created(ServiceResponse::new(CreatedReservationDto {
                reservation_id: id.to_string(),
            }))
        }
        Ok(Err(e)) => {
            record_reservation_rejected(e.kind());
            info!(request_id = %request_id, kind = %e.kind(), error = %e, "reservation rejected");
            Response::Error(from_booking_error(&e, request_id.as_str()))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "booking task failed");
            Response::Error(ProblemDetails::internal_error(
                "booking task failed",
                request_id.as_str(),
            ))
        }
    }
}

/// Handle GET /reservations.
async fn list_reservations(
    State(state): State<AppState>,
    request_id: RequestId,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            return Response::Error(ProblemDetails::bad_request(
                rejection.body_text(),
                request_id.as_str(),
            ))
        }
    };
    let filter = match query.into_filter(request_id.as_str()) {
        Ok(filter) => filter,
        Err(problem) => return Response::Error(*problem),
    };

    let coordinator = state.coordinator_arc();
    let outcome =
        tokio::task::spawn_blocking(move || coordinator.list_reservations(&filter)).await;

    match outcome {
        Ok(Ok(reservations)) => {
            record_reservations_listed(reservations.len());
            info!(request_id = %request_id, count = reservations.len(), "reservations listed");
            Response::Listed(ServiceResponse::new(ReservationListDto { reservations }))
        }
        Ok(Err(e)) => {
            error!(request_id = %request_id, error = %e, "listing reservations failed");
            Response::Error(from_booking_error(&e, request_id.as_str()))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "listing task failed");
            Response::Error(ProblemDetails::internal_error(
                "listing task failed",
                request_id.as_str(),
            ))
        }
    }
}

async fn route_not_found(method: Method, uri: Uri, request_id: RequestId) -> ProblemDetails {
    ProblemDetails::route_not_found(method.as_str(), uri.path(), request_id.as_str())
}
