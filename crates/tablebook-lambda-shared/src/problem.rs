//! RFC 9457 Problem Details for Lambda error responses.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use http::StatusCode;
use serde::{Deserialize, Serialize};

use tablebook_lib::{BookingError, ErrorKind};

/// Problem type URI for malformed or incomplete booking requests.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for bookings against tables missing from the catalog.
pub const PROBLEM_TABLE_NOT_FOUND: &str = "/problems/table-not-found";

/// Problem type URI for slots that overlap a committed reservation.
pub const PROBLEM_RESERVATION_CONFLICT: &str = "/problems/reservation-conflict";

/// Problem type URI for unknown method/path combinations.
pub const PROBLEM_ROUTE_NOT_FOUND: &str = "/problems/route-not-found";

/// Problem type URI for requests cancelled before their commit.
pub const PROBLEM_REQUEST_CANCELLED: &str = "/problems/request-cancelled";

/// Problem type URI for internal errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Problem type URI for storage that stayed unavailable after retries.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

/// RFC 9457 Problem Details response body.
///
/// `errorKind` is an extension member carrying the machine-readable booking
/// error kind (`ValidationError`, `ConflictError`, ...).
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

    /// The request identifier for this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Same text as `detail`, under the name plain JSON clients read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(rename = "errorKind", skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    /// Content type for this response (always "application/problem+json").
    pub content_type: String,
}

impl ProblemDetails {
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

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.message = Some(detail.clone());
        self.detail = Some(detail);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    pub fn with_error_kind(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind.as_str().to_string());
        self
    }

    /// 400 for a body or query string that cannot be used.
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

    /// 404 for a method/path pair this function does not serve.
    pub fn route_not_found(method: &str, path: &str, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_ROUTE_NOT_FOUND,
            "Route Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(format!("No handler for {method} {path}"))
        .with_request_id(request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

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
        write!(f, "{}: {}", self.title, self.detail.as_deref().unwrap_or(""))
    }
}

impl std::error::Error for ProblemDetails {}

/// Convert a booking error to ProblemDetails.
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tablebook_lib::Slot;

    #[test]
    fn conflict_maps_to_409_with_kind() {
        let error = BookingError::Conflict {
            table_number: 5,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            existing: Slot::parse("18:00", "19:00").unwrap(),
        };
        let problem = from_booking_error(&error, "req-1");

        assert_eq!(problem.status, 409);
        assert_eq!(problem.type_uri, PROBLEM_RESERVATION_CONFLICT);
        assert_eq!(problem.error_kind.as_deref(), Some("ConflictError"));
        assert!(problem.detail.as_deref().unwrap().contains("18:00-19:00"));
        assert_eq!(problem.instance.as_deref(), Some("req-1"));
    }

    #[test]
    fn every_kind_has_a_status() {
        let cases = [
            (BookingError::validation("date", "is required"), 400),
            (BookingError::TableNotFound { table_number: 9 }, 404),
            (BookingError::Cancelled, 503),
        ];
        for (error, status) in cases {
            assert_eq!(from_booking_error(&error, "r").status, status);
        }
    }

    #[test]
    fn serializes_error_kind_extension() {
        let json = serde_json::to_value(ProblemDetails::bad_request("broken", "req-2")).unwrap();
        assert_eq!(json["type"], "/problems/invalid-request");
        assert_eq!(json["errorKind"], "ValidationError");
        assert_eq!(json["content_type"], "application/problem+json");
    }

    #[test]
    fn message_mirrors_detail() {
        let problem = from_booking_error(&BookingError::TableNotFound { table_number: 9 }, "r");
        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["message"], "table 9 does not exist");
        assert_eq!(json["message"], json["detail"]);
        assert_eq!(json["errorKind"], "NotFoundError");
    }

    #[test]
    fn route_not_found_names_the_route() {
        let problem = ProblemDetails::route_not_found("DELETE", "/reservations", "r");
        assert_eq!(problem.status, 404);
        assert!(problem.error_kind.is_none());
        assert_eq!(
            problem.detail.as_deref(),
            Some("No handler for DELETE /reservations")
        );
    }
}
