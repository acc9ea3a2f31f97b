//! Shared infrastructure for the table reservation HTTP service.
//!
//! - [`AppState`]: the booking coordinator shared by every handler
//! - [`health`]: liveness/readiness handlers
//! - [`ProblemDetails`]: RFC 9457 error bodies with the `errorKind` extension
//! - [`ServiceResponse`]: success envelope with content type
//! - [`metrics`]: Prometheus recorder and booking counters
//! - [`logging`]: JSON or text logging setup
//! - [`middleware`]: request ID propagation and HTTP metrics
//!
//! # Architecture
//!
//! Handlers stay thin: all booking rules live in `tablebook-lib`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Parse request JSON                                       │
//! │  - Call BookingCoordinator on the blocking pool             │
//! │  - Map BookingError to ProblemDetails                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! Enable the `test-utils` feature to reach [`test_utils`] from dependent crates.

#![deny(warnings)]

mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_reservation_committed, record_reservation_rejected,
    record_reservations_listed, MetricsConfig, MetricsError,
};
pub use middleware::{
    extract_or_generate_request_id, request_id_of, MetricsLayer, RequestId, REQUEST_ID_HEADER,
};
pub use problem::{
    from_booking_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_REQUEST_CANCELLED, PROBLEM_RESERVATION_CONFLICT, PROBLEM_ROUTE_NOT_FOUND,
    PROBLEM_SERVICE_UNAVAILABLE, PROBLEM_TABLE_NOT_FOUND,
};
pub use response::ServiceResponse;
pub use state::{AppState, AppStateError};
