//! Shared infrastructure for Tablebook AWS Lambda functions.
//!
//! - [`LambdaRuntime`]: booking coordinator created once per cold start
//! - [`init_tracing`]: JSON-formatted tracing for CloudWatch Logs
//! - [`ProblemDetails`]: RFC 9457 Problem Details for consistent error responses
//! - [`ApiGatewayRequest`] / [`ApiGatewayResponse`]: proxy integration shapes
//! - [`LambdaResponse`]: wrapper for successful payloads with content type
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides seeded databases and proxy event
//! builders. Enable the `test-utils` feature to access it from dependent crates.

mod events;
mod problem;
mod response;
mod runtime;
mod tracing_init;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use events::{ApiGatewayRequest, ApiGatewayResponse};
pub use problem::{
    from_booking_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_REQUEST_CANCELLED, PROBLEM_RESERVATION_CONFLICT, PROBLEM_ROUTE_NOT_FOUND,
    PROBLEM_SERVICE_UNAVAILABLE, PROBLEM_TABLE_NOT_FOUND,
};
pub use response::LambdaResponse;
pub use runtime::{
    cancellation_for_deadline, database_path_from_env, get_runtime, init_error_to_problem,
    init_runtime, init_runtime_at, InitError, LambdaRuntime, DEADLINE_SAFETY_MARGIN,
};
pub use tracing_init::init_tracing;
