//! RFC 9457 Problem Details for HTTP APIs.
//!
//! Provides structured error responses following the Problem Details standard.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use tablebook_lib::{BookingError, ErrorKind};

/// Problem type URI for malformed or incomplete booking requests.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for bookings against tables missing from the catalog.
pub const PROBLEM_TABLE_NOT_FOUND: &str = "/problems/table-not-found";

/// Problem type URI for slots that overlap a committed reservation.
pub const PROBLEM_RESERVATION_CONFLICT: &str = "/problems/reservation-conflict";

/// Problem type URI for paths the service does not serve.
pub const PROBLEM_ROUTE_NOT_FOUND: &str = "/problems/route-not-found";

/// Problem type URI for requests cancelled before their commit.
pub const PROBLEM_REQUEST_CANCELLED: &str = "/problems/request-cancelled";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Problem type URI for service unavailable (storage down, retries exhausted).
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

/// RFC 9457 Problem Details response structure.
///
/// Provides a consistent format for error responses across all endpoints.
/// Booking failures also carry the `errorKind` extension member.
///
/// # Example
///
/// ```
/// use tablebook_service_shared::{ProblemDetails, PROBLEM_TABLE_NOT_FOUND};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_TABLE_NOT_FOUND,
///     "Table Not Found",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("table 42 does not exist")
/// .with_request_id("req-12345");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI reference identifying the specific occurrence (e.g., request ID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Booking error kind such as `ConflictError`.
    /// Same text as `detail`, under the name plain JSON clients read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(rename = "errorKind", skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    /// Content type for this response (always "application/problem+json").
    pub content_type: String,
}

impl ProblemDetails {
    /// Create a new ProblemDetails with required fields.
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            message: None,
            error_kind: None,
            content_type: "application/problem+json".to_string(),
        }
    }

    /// Add a detailed explanation of this specific problem occurrence.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.message = Some(detail.clone());
        self.detail = Some(detail);
        self
    }

    /// Add the request identifier for tracing.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    pub fn with_error_kind(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind.as_str().to_string());
        self
    }

    /// Create a 400 Bad Request problem for invalid input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
        .with_error_kind(ErrorKind::Validation)
    }

    /// Create a 404 Not Found problem for an unserved method and path.
    pub fn route_not_found(method: &str, path: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_ROUTE_NOT_FOUND,
            "Route Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(format!("No handler for {method} {path}"))
        .with_request_id(request_id)
    }

    /// Create a 500 Internal Server Error problem.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 503 Service Unavailable problem.
    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

/// Implement IntoResponse for axum to return ProblemDetails as HTTP responses.
impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        *response.status_mut() = status;
        response
    }
}

/// Convert booking errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_booking_error(error: &BookingError, request_id: &str) -> ProblemDetails {
    let problem = match error {
        BookingError::Validation { .. } => ProblemDetails::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        ),
        BookingError::TableNotFound { .. } => ProblemDetails::new(
            PROBLEM_TABLE_NOT_FOUND,
            "Table Not Found",
            StatusCode::NOT_FOUND,
        ),
        BookingError::Conflict { .. } => ProblemDetails::new(
            PROBLEM_RESERVATION_CONFLICT,
            "Reservation Conflict",
            StatusCode::CONFLICT,
        ),
        BookingError::Storage { .. } => ProblemDetails::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        BookingError::Cancelled => ProblemDetails::new(
            PROBLEM_REQUEST_CANCELLED,
            "Request Cancelled",
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    };

    problem
        .with_detail(error.to_string())
        .with_request_id(request_id)
        .with_error_kind(error.kind())
}
