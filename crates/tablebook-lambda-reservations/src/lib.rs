//! AWS Lambda function for table reservations.
//!
//! Serves `POST /reservations` (book a table) and `GET /reservations`
//! (list bookings) behind an API Gateway proxy integration.

mod models;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, warn};

use tablebook_lambda_shared::{
    cancellation_for_deadline, from_booking_error, get_runtime, init_error_to_problem,
    init_runtime, init_tracing, ApiGatewayRequest, ApiGatewayResponse, LambdaResponse,
    LambdaRuntime, ProblemDetails,
};
use tablebook_lib::{Cancellation, CreateReservationRequest};

pub use models::{filter_from_query, CreatedReservationDto, ReservationListDto};

/// Resource path served by this function.
pub const RESERVATIONS_PATH: &str = "/reservations";

/// Handler outcome - a success payload or an RFC 9457 error.
#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
pub enum Response {
    Created(LambdaResponse<CreatedReservationDto>),
    Listed(LambdaResponse<ReservationListDto>),
    Error(ProblemDetails),
}

impl Response {
    pub fn status(&self) -> u16 {
        match self {
            Response::Created(_) | Response::Listed(_) => 200,
            Response::Error(problem) => problem.status,
        }
    }

    /// Convert into the proxy integration shape.
    pub fn into_proxy(self) -> ApiGatewayResponse {
        match self {
            Response::Created(body) => ApiGatewayResponse::json(200, &body),
            Response::Listed(body) => ApiGatewayResponse::json(200, &body),
            Response::Error(problem) => ApiGatewayResponse::problem(&problem),
        }
    }
}

/// Entry point used by the Lambda runtime.
pub async fn run() -> Result<(), Error> {
    init_tracing();

    // A failed init is reported per request as a 503 problem.
    if let Err(e) = init_runtime() {
        warn!(error = %e, "starting without a usable reservation store");
    }

    lambda_runtime::run(service_fn(handler)).await
}

/// Lambda handler invoked per request.
pub async fn handler(event: LambdaEvent<Value>) -> Result<ApiGatewayResponse, Error> {
    let request_id = event.context.request_id.clone();
    let cancellation = cancellation_for_deadline(event.context.deadline);

    let request: ApiGatewayRequest = match serde_json::from_value(event.payload) {
        Ok(req) => req,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "failed to parse proxy event");
            let problem =
                ProblemDetails::bad_request(format!("Invalid request: {}", e), &request_id);
            return Ok(ApiGatewayResponse::problem(&problem));
        }
    };

    let Some(runtime) = get_runtime() else {
        return Ok(ApiGatewayResponse::problem(&init_error_to_problem(&request_id)));
    };

    Ok(handle_event(runtime, &request, &request_id, &cancellation).into_proxy())
}

/// Route a proxy request. Separated from [`handler`] so tests can supply
/// their own runtime.
pub fn handle_event(
    runtime: &LambdaRuntime,
    request: &ApiGatewayRequest,
    request_id: &str,
    cancellation: &Cancellation,
) -> Response {
    let method = request.http_method.to_ascii_uppercase();
    let path = match request.path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    info!(request_id = %request_id, method = %method, path = %path, "handling request");

    match (method.as_str(), path) {
        ("POST", RESERVATIONS_PATH) => create_reservation(runtime, request, request_id, cancellation),
        ("GET", RESERVATIONS_PATH) => list_reservations(runtime, request, request_id),
        _ => Response::Error(ProblemDetails::route_not_found(
            &method,
            &request.path,
            request_id,
        )),
    }
}

fn create_reservation(
    runtime: &LambdaRuntime,
    request: &ApiGatewayRequest,
    request_id: &str,
    cancellation: &Cancellation,
) -> Response {
    let booking: CreateReservationRequest = match request.json_body() {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            return Response::Error(ProblemDetails::bad_request(
                "request body is required",
                request_id,
            ))
        }
        Err(e) => {
            return Response::Error(ProblemDetails::bad_request(
                format!("Invalid request body: {}", e),
                request_id,
            ))
        }
    };

    match runtime
        .coordinator()
        .create_reservation(&booking, cancellation)
    {
        Ok(id) => {
            info!(request_id = %request_id, reservation_id = %id, "reservation created");
            Response::Created(LambdaResponse::new(CreatedReservationDto {
                reservation_id: id.to_string(),
            }))
        }
        Err(e) => {
            info!(request_id = %request_id, kind = %e.kind(), error = %e, "reservation rejected");
            Response::Error(from_booking_error(&e, request_id))
        }
    }
}

fn list_reservations(
    runtime: &LambdaRuntime,
    request: &ApiGatewayRequest,
    request_id: &str,
) -> Response {
    let filter = match filter_from_query(request, request_id) {
        Ok(filter) => filter,
        Err(problem) => return Response::Error(*problem),
    };

    match runtime.coordinator().list_reservations(&filter) {
        Ok(reservations) => {
            info!(request_id = %request_id, count = reservations.len(), "reservations listed");
            Response::Listed(LambdaResponse::new(ReservationListDto { reservations }))
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "listing reservations failed");
            Response::Error(from_booking_error(&e, request_id))
        }
    }
}
