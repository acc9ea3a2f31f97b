use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use rusqlite::{params, Connection};
use serde::Deserialize;
use tracing::debug;

use crate::error::{FixtureError, StorageError};
use crate::model::Table;

/// Environment variable naming the SQLite database used by deployed handlers.
pub const ENV_DB_PATH: &str = "RESERVATIONS_DB_PATH";

/// Database path used by deployed handlers when [`ENV_DB_PATH`] is unset.
pub const DEFAULT_DB_PATH: &str = "/data/reservations.db";

/// How long a writer waits for a competing transaction before reporting busy.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dining_tables (
    number    INTEGER PRIMARY KEY,
    capacity  INTEGER NOT NULL,
    is_vip    INTEGER NOT NULL DEFAULT 0,
    min_order REAL    NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS reservations (
    id              TEXT PRIMARY KEY,
    table_number    INTEGER NOT NULL,
    date            TEXT NOT NULL,
    slot_start      TEXT NOT NULL,
    slot_end        TEXT NOT NULL,
    client_name     TEXT NOT NULL,
    phone_number    TEXT NOT NULL,
    conflict_key    TEXT NOT NULL UNIQUE,
    idempotency_key TEXT UNIQUE
);

CREATE INDEX IF NOT EXISTS reservations_partition
    ON reservations (table_number, date);
";

/// Open (creating if needed) the reservation database at `path`.
///
/// The connection gets a busy timeout so that concurrent writers queue instead
/// of failing, uses write-ahead logging, and has the schema in place.
pub fn open_database(path: &Path) -> Result<Connection, StorageError> {
    let connection = Connection::open(path)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    let mode: String =
        connection.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    debug!(path = %path.display(), journal_mode = %mode, "opened reservation database");
    ensure_schema(&connection)?;
    Ok(connection)
}

/// Private in-memory database with the schema applied.
pub fn open_in_memory() -> Result<Connection, StorageError> {
    let connection = Connection::open_in_memory()?;
    ensure_schema(&connection)?;
    Ok(connection)
}

/// Create the catalog and reservation tables when missing.
pub fn ensure_schema(connection: &Connection) -> Result<(), StorageError> {
    connection.execute_batch(SCHEMA)?;
    Ok(())
}

/// Insert or replace catalog rows. Returns the number of tables written.
pub fn import_tables(connection: &mut Connection, tables: &[Table]) -> Result<usize, StorageError> {
    let tx = connection.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO dining_tables (number, capacity, is_vip, min_order)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for table in tables {
            stmt.execute(params![
                table.number,
                table.capacity,
                table.is_vip,
                table.min_order
            ])?;
        }
    }
    tx.commit()?;
    debug!(count = tables.len(), "imported dining tables");
    Ok(tables.len())
}

/// All catalog rows ordered by table number.
pub fn load_tables(connection: &Connection) -> Result<Vec<Table>, StorageError> {
    let mut stmt = connection
        .prepare("SELECT number, capacity, is_vip, min_order FROM dining_tables ORDER BY number")?;
    let rows = stmt.query_map([], |row| {
        Ok(Table {
            number: row.get(0)?,
            capacity: row.get(1)?,
            is_vip: row.get(2)?,
            min_order: row.get(3)?,
        })
    })?;

    let mut tables = Vec::new();
    for row in rows {
        tables.push(row?);
    }
    Ok(tables)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TableFixture {
    List(Vec<Table>),
    Wrapped { tables: Vec<Table> },
}

/// Read a JSON table fixture: either an array of tables or `{"tables": [...]}`.
pub fn load_tables_fixture(path: &Path) -> Result<Vec<Table>, FixtureError> {
    let raw = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fixture: TableFixture =
        serde_json::from_str(&raw).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(match fixture {
        TableFixture::List(tables) | TableFixture::Wrapped { tables } => tables,
    })
}

/// Per-user database location for local runs, e.g.
/// `~/.local/share/tablebook/reservations.db` on Linux.
pub fn default_database_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tablebook").map(|dirs| dirs.data_dir().join("reservations.db"))
}
