//! Test utilities for Lambda handler testing.
//!
//! ```ignore
//! use tablebook_lambda_shared::test_utils::{proxy_event, test_runtime};
//!
//! let (_db, runtime) = test_runtime(&[5]);
//! let event = proxy_event("GET", "/reservations", None, &[]);
//! ```

use std::path::PathBuf;

use serde_json::{json, Map, Value};
use tempfile::TempDir;

use tablebook_lib::{db, BookingCoordinator, RetryPolicy, Table, TableNumber};

use crate::runtime::LambdaRuntime;

/// Temporary on-disk database seeded with four-seat tables.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn seeded_database(tables: &[TableNumber]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temporary directory");
    let path = dir.path().join("reservations.db");
    let mut conn = db::open_database(&path).expect("database should open");
    let tables: Vec<Table> = tables
        .iter()
        .map(|&number| Table {
            number,
            capacity: 4,
            is_vip: false,
            min_order: 0.0,
        })
        .collect();
    db::import_tables(&mut conn, &tables).expect("tables should import");
    (dir, path)
}

/// Runtime over a fresh seeded database, with immediate retries.
pub fn test_runtime(tables: &[TableNumber]) -> (TempDir, LambdaRuntime) {
    let (dir, path) = seeded_database(tables);
    let coordinator = BookingCoordinator::open(&path)
        .expect("coordinator should open")
        .with_retry_policy(RetryPolicy::immediate(3));
    (dir, LambdaRuntime::from_coordinator(coordinator))
}

/// Build an API Gateway proxy event. `body` is sent as a JSON string, the way
/// API Gateway delivers it.
pub fn proxy_event(method: &str, path: &str, body: Option<Value>, query: &[(&str, &str)]) -> Value {
    let mut event = json!({
        "httpMethod": method,
        "path": path,
    });
    if let Some(body) = body {
        event["body"] = Value::String(body.to_string());
    }
    if !query.is_empty() {
        let params: Map<String, Value> = query
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        event["queryStringParameters"] = Value::Object(params);
    }
    event
}

/// Booking body for table `table` on 2024-06-01.
pub fn booking_body(table: i64, start: &str, end: &str) -> Value {
    json!({
        "tableNumber": table,
        "date": "2024-06-01",
        "slotTimeStart": start,
        "slotTimeEnd": end,
        "clientName": "A",
        "phoneNumber": "555",
    })
}

pub fn mock_request_id(suffix: &str) -> String {
    format!("test-request-{}", suffix)
}
