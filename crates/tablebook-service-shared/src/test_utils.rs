//! Test utilities for HTTP handler testing.
//!
//! Each call builds a fresh on-disk database so tests never share bookings.

use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;

use tablebook_lib::{db, BookingCoordinator, RetryPolicy, Table, TableNumber};

use crate::state::AppState;

/// A seeded database kept alive for the duration of a test.
pub struct TestDatabase {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDatabase {
    /// Create a database whose catalog holds four-seat tables `numbers`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary database cannot be created.
    pub fn with_tables(numbers: &[TableNumber]) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temporary directory");
        let path = dir.path().join("reservations.db");
        let mut conn = db::open_database(&path).expect("database should open");
        let tables: Vec<Table> = numbers
            .iter()
            .map(|&number| Table {
                number,
                capacity: 4,
                is_vip: false,
                min_order: 0.0,
            })
            .collect();
        db::import_tables(&mut conn, &tables).expect("tables should import");
        Self { _dir: dir, path }
    }

    /// Application state over this database with immediate retries.
    pub fn state(&self) -> AppState {
        let coordinator = BookingCoordinator::open(&self.path)
            .expect("coordinator should open")
            .with_retry_policy(RetryPolicy::immediate(3));
        AppState::from_coordinator(coordinator)
    }
}

/// Fresh state over tables `numbers`; the database lives as long as the guard.
pub fn test_state(numbers: &[TableNumber]) -> (TestDatabase, AppState) {
    let database = TestDatabase::with_tables(numbers);
    let state = database.state();
    (database, state)
}

/// JSON body for `POST /reservations` on 2024-06-01.
pub fn booking_body(table_number: i64, start: &str, end: &str) -> Value {
    json!({
        "tableNumber": table_number,
        "date": "2024-06-01",
        "slotTimeStart": start,
        "slotTimeEnd": end,
        "clientName": "Ada Lovelace",
        "phoneNumber": "+44 20 7946 0000",
    })
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
