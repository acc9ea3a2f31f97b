//! Tablebook library entry points.
//!
//! This crate holds the reservation booking engine: the slot model, the
//! availability checker, the booking coordinator and the storage interfaces it
//! consumes, along with SQLite and in-memory adapters. Transports (cloud
//! function, HTTP service, CLI) should only depend on what is exported here
//! instead of reimplementing booking rules.
//!
//! The API is synchronous; async callers run it on a blocking thread.

pub mod availability;
pub mod booking;
pub mod cancel;
pub mod catalog;
pub mod db;
pub mod error;
pub mod model;
pub mod request;
pub mod retry;
pub mod store;

pub use availability::{find_conflict, find_conflicts, is_available, overlaps};
pub use booking::{BookingCoordinator, BookingStage};
pub use cancel::Cancellation;
pub use catalog::{InMemoryTableCatalog, SqliteTableCatalog, TableCatalog};
pub use db::{
    default_database_path, import_tables, load_tables, load_tables_fixture, open_database,
    DEFAULT_DB_PATH, ENV_DB_PATH,
};
pub use error::{BookingError, ErrorKind, FixtureError, InsertError, Result, StorageError};
pub use model::{
    ConflictKey, Reservation, ReservationFilter, ReservationId, Slot, Table, TableNumber,
};
pub use request::{CreateReservationRequest, NewReservation};
pub use retry::RetryPolicy;
pub use store::{InMemoryReservationRepository, ReservationRepository, SqliteReservationRepository};
