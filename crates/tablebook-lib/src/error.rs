use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

use crate::model::{ConflictKey, Slot, TableNumber};

/// Convenient result alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Failures reported by a storage adapter (repository or catalog).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The backing store could not be reached or is temporarily unusable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A persisted record could not be decoded.
    #[error("corrupt reservation record {id}: {message}")]
    Corrupt { id: String, message: String },
}

impl StorageError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Sqlite(rusqlite::Error::SqliteFailure(error, _)) => matches!(
                error.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            StorageError::Unavailable(_) => true,
            _ => false,
        }
    }
}

/// Outcome of a rejected conditional insert.
#[derive(Debug, Error)]
pub enum InsertError {
    /// The conflict key, an overlapping slot or the idempotency key is
    /// already taken. Never surfaced to callers as-is.
    #[error("a reservation already occupies {key}")]
    AlreadyExists { key: ConflictKey },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for InsertError {
    fn from(error: rusqlite::Error) -> Self {
        InsertError::Storage(StorageError::Sqlite(error))
    }
}

/// Machine-readable classification of a booking failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "ConflictError")]
    Conflict,
    #[serde(rename = "StorageError")]
    Storage,
    #[serde(rename = "CancelledError")]
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::Cancelled => "CancelledError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way `create_reservation` and `list_reservations` can fail.
#[derive(Debug, Error)]
pub enum BookingError {
    /// A required field is missing or malformed. Raised before any storage access.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The referenced table is not in the catalog.
    #[error("table {table_number} does not exist")]
    TableNotFound { table_number: TableNumber },

    /// The requested slot overlaps an already committed reservation.
    #[error("table {table_number} is already reserved on {date} for {existing}")]
    Conflict {
        table_number: TableNumber,
        date: NaiveDate,
        existing: Slot,
    },

    /// Storage kept failing after all retry attempts.
    #[error("storage failed after {attempts} attempt(s): {source}")]
    Storage {
        attempts: u32,
        #[source]
        source: StorageError,
    },

    /// The caller gave up (or its deadline passed) before the commit was attempted.
    #[error("booking was cancelled before it could be committed")]
    Cancelled,
}

impl BookingError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        BookingError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::Validation { .. } => ErrorKind::Validation,
            BookingError::TableNotFound { .. } => ErrorKind::NotFound,
            BookingError::Conflict { .. } => ErrorKind::Conflict,
            BookingError::Storage { .. } => ErrorKind::Storage,
            BookingError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Raised when a table fixture file cannot be imported.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read table fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid table fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_sqlite_errors_are_transient() {
        let busy = StorageError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(busy.is_transient());

        let constraint = StorageError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            None,
        ));
        assert!(!constraint.is_transient());

        assert!(StorageError::Unavailable("down".to_string()).is_transient());
        assert!(!StorageError::Corrupt {
            id: "x".to_string(),
            message: "bad".to_string()
        }
        .is_transient());
    }

    #[test]
    fn conflict_message_cites_existing_slot() {
        let error = BookingError::Conflict {
            table_number: 5,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            existing: Slot::parse("18:00", "19:00").unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "table 5 is already reserved on 2024-06-01 for 18:00-19:00"
        );
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn error_kind_serializes_as_wire_name() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"NotFoundError\"");
        assert_eq!(ErrorKind::Validation.to_string(), "ValidationError");
    }
}
