//! Application state for the HTTP service.
//!
//! Handlers reach the booking coordinator through axum's `State` extractor.
//! Each service process is an independent worker; processes coordinate only
//! through the shared database.

use std::path::Path;
use std::sync::Arc;

use tablebook_lib::{BookingCoordinator, StorageError};

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The database file does not exist.
    DatabaseNotFound(String),

    /// The database exists but could not be opened or migrated.
    Storage(StorageError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseNotFound(path) => write!(f, "database not found: {}", path),
            Self::Storage(e) => write!(f, "failed to open reservation store: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::DatabaseNotFound(_) => None,
        }
    }
}

impl From<StorageError> for AppStateError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

/// Shared application state for all axum handlers.
///
/// Cheap to clone (`Arc` inside).
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use tablebook_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) {
///     let coordinator = state.coordinator();
///     // ... book or list
/// }
///
/// let state = AppState::load("/data/reservations.db").unwrap();
/// let app = Router::new()
///     .route("/reservations", get(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<BookingCoordinator>,
}

impl AppState {
    /// Open the reservation database and build the coordinator.
    ///
    /// The file must already exist; the service never creates an empty
    /// catalog on its own (use `tablebook-cli init` for that).
    pub fn load(db_path: impl AsRef<Path>) -> Result<Self, AppStateError> {
        let db_path = db_path.as_ref();

        if !db_path.exists() {
            return Err(AppStateError::DatabaseNotFound(
                db_path.display().to_string(),
            ));
        }

        tracing::info!(path = %db_path.display(), "opening reservation store");
        let coordinator = BookingCoordinator::open(db_path)?;
        tracing::info!(
            max_attempts = coordinator.retry_policy().attempts(),
            "reservation store ready"
        );

        Ok(Self::from_coordinator(coordinator))
    }

    /// Wrap an already built coordinator (tests, in-memory adapters).
    pub fn from_coordinator(coordinator: BookingCoordinator) -> Self {
        Self {
            inner: Arc::new(coordinator),
        }
    }

    /// The coordinator, for borrowing inside a handler.
    pub fn coordinator(&self) -> &BookingCoordinator {
        &self.inner
    }

    /// An owned handle for moving into `spawn_blocking`.
    pub fn coordinator_arc(&self) -> Arc<BookingCoordinator> {
        Arc::clone(&self.inner)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("coordinator", &self.inner)
            .finish()
    }
}
