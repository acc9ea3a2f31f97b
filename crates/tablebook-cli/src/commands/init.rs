//! `init`: create the database schema and optionally import tables.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use tablebook_lib::{import_tables, load_tables, load_tables_fixture, open_database};

/// What `init` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Tables imported from the fixture (0 without `--tables`).
    pub imported: usize,
    /// Tables in the catalog afterwards.
    pub total: usize,
}

/// Create (or upgrade) the database at `db_path` and import `tables_fixture`.
///
/// Running it again is harmless: the schema is created only when missing and
/// imported tables replace rows with the same number.
pub fn handle_init(db_path: &Path, tables_fixture: Option<&Path>) -> Result<InitReport> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut conn = open_database(db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    let imported = match tables_fixture {
        Some(fixture) => {
            let tables = load_tables_fixture(fixture)?;
            let count = import_tables(&mut conn, &tables)
                .with_context(|| format!("failed to import tables into {}", db_path.display()))?;
            info!(fixture = %fixture.display(), count, "imported table fixture");
            count
        }
        None => 0,
    };

    let total = load_tables(&conn).context("failed to read the table catalog")?.len();
    Ok(InitReport { imported, total })
}
