//! Lambda runtime initialization.
//!
//! The booking coordinator and its SQLite connections are created once per
//! cold start and reused by every invocation served by the same instance.
//! Separate instances are independent workers; they coordinate only through
//! the database.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{error, info};

use tablebook_lib::{BookingCoordinator, Cancellation, StorageError, DEFAULT_DB_PATH, ENV_DB_PATH};

use crate::problem::ProblemDetails;

/// Time kept in reserve before the invocation deadline so a cancelled
/// booking can still report back.
pub const DEADLINE_SAFETY_MARGIN: Duration = Duration::from_millis(250);

static RUNTIME: OnceLock<Result<LambdaRuntime, InitError>> = OnceLock::new();

/// Error during runtime initialization.
#[derive(Debug, Clone)]
pub struct InitError {
    pub message: String,
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lambda initialization failed: {}", self.message)
    }
}

impl std::error::Error for InitError {}

impl From<StorageError> for InitError {
    fn from(err: StorageError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Initialized Lambda runtime holding the booking coordinator.
#[derive(Debug, Clone)]
pub struct LambdaRuntime {
    coordinator: Arc<BookingCoordinator>,
}

impl LambdaRuntime {
    /// Wrap an already built coordinator (used by tests and custom wiring).
    pub fn from_coordinator(coordinator: BookingCoordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }

    pub fn coordinator(&self) -> &BookingCoordinator {
        &self.coordinator
    }
}

/// Database path from `RESERVATIONS_DB_PATH`, defaulting to `/data/reservations.db`.
pub fn database_path_from_env() -> PathBuf {
    std::env::var_os(ENV_DB_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

/// Initialize the runtime from the environment.
///
/// Later calls return the result of the first one.
pub fn init_runtime() -> Result<&'static LambdaRuntime, InitError> {
    init_runtime_at(&database_path_from_env())
}

/// Initialize the runtime against an explicit database path.
pub fn init_runtime_at(db_path: &Path) -> Result<&'static LambdaRuntime, InitError> {
    let result = RUNTIME.get_or_init(|| {
        let start = Instant::now();
        info!(db_path = %db_path.display(), "initializing Lambda runtime");

        let coordinator = BookingCoordinator::open(db_path)?;
        info!(
            init_ms = start.elapsed().as_millis() as u64,
            max_attempts = coordinator.retry_policy().attempts(),
            "Lambda runtime initialization complete"
        );
        Ok(LambdaRuntime::from_coordinator(coordinator))
    });

    result.as_ref().map_err(|e| {
        error!(error = %e, "Lambda runtime initialization failed");
        e.clone()
    })
}

/// The runtime, when initialization has succeeded.
pub fn get_runtime() -> Option<&'static LambdaRuntime> {
    RUNTIME.get().and_then(|result| result.as_ref().ok())
}

/// Create a `ProblemDetails` for initialization errors.
pub fn init_error_to_problem(request_id: &str) -> ProblemDetails {
    match RUNTIME.get() {
        Some(Err(e)) => ProblemDetails::service_unavailable(e.message.clone(), request_id),
        _ => ProblemDetails::service_unavailable("Runtime initialization failed", request_id),
    }
}

/// Cancellation handle for an invocation whose deadline is `deadline_ms`
/// milliseconds since the Unix epoch. Zero means no deadline.
pub fn cancellation_for_deadline(deadline_ms: u64) -> Cancellation {
    if deadline_ms == 0 {
        return Cancellation::new();
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0);
    let remaining = Duration::from_millis(deadline_ms.saturating_sub(now_ms))
        .saturating_sub(DEADLINE_SAFETY_MARGIN);
    Cancellation::with_timeout(remaining)
}
