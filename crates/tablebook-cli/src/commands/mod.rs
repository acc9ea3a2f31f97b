// One module per subcommand; main.rs parses arguments and dispatches here.

pub mod book;
pub mod init;
pub mod list;

use std::path::Path;

use anyhow::{bail, Context, Result};

use tablebook_lib::BookingCoordinator;

/// Open the coordinator for an existing database.
///
/// `book` and `list` never create a database: an empty catalog would turn
/// every booking into a confusing "table does not exist".
pub(crate) fn open_existing(db_path: &Path) -> Result<BookingCoordinator> {
    if !db_path.exists() {
        bail!(
            "database {} does not exist; run `tablebook-cli init` first",
            db_path.display()
        );
    }
    BookingCoordinator::open(db_path)
        .with_context(|| format!("failed to open reservation database {}", db_path.display()))
}
