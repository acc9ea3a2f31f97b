//! Read-only lookup of the tables that can be booked.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};

use crate::db;
use crate::error::StorageError;
use crate::model::{Table, TableNumber};

/// Source of truth for which table numbers exist.
///
/// The booking engine never writes to the catalog.
pub trait TableCatalog: Send + Sync {
    fn exists(&self, table_number: TableNumber) -> Result<bool, StorageError>;

    /// Number of known tables. Used as a cheap readiness probe.
    fn table_count(&self) -> Result<usize, StorageError>;
}

/// Fixed catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableCatalog {
    tables: BTreeMap<TableNumber, Table>,
}

impl InMemoryTableCatalog {
    pub fn new(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|table| (table.number, table))
                .collect(),
        }
    }

    /// Catalog of plain four-seat tables with the given numbers.
    pub fn with_numbers(numbers: impl IntoIterator<Item = TableNumber>) -> Self {
        Self::new(numbers.into_iter().map(|number| Table {
            number,
            capacity: 4,
            is_vip: false,
            min_order: 0.0,
        }))
    }

    pub fn get(&self, table_number: TableNumber) -> Option<&Table> {
        self.tables.get(&table_number)
    }
}

impl TableCatalog for InMemoryTableCatalog {
    fn exists(&self, table_number: TableNumber) -> Result<bool, StorageError> {
        Ok(self.tables.contains_key(&table_number))
    }

    fn table_count(&self) -> Result<usize, StorageError> {
        Ok(self.tables.len())
    }
}

/// Catalog backed by the `dining_tables` table.
pub struct SqliteTableCatalog {
    conn: Mutex<Connection>,
}

impl SqliteTableCatalog {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("catalog connection lock poisoned".to_string()))
    }
}

impl TableCatalog for SqliteTableCatalog {
    fn exists(&self, table_number: TableNumber) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT number FROM dining_tables WHERE number = ?1",
                [table_number],
                |row| row.get::<_, TableNumber>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn table_count(&self) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM dining_tables", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
