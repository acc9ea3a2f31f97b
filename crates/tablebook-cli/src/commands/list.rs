//! `list`: print reservations, optionally filtered.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};

use tablebook_lib::model::parse_date;
use tablebook_lib::{Reservation, ReservationFilter, TableNumber};

use super::open_existing;
use crate::output::{write_reservations, OutputFormat};
use crate::terminal::ColorPalette;

/// Build the filter from `--table` / `--date`.
pub fn build_filter(table: Option<TableNumber>, date: Option<&str>) -> Result<ReservationFilter> {
    let date = match date {
        None => None,
        Some(raw) => match parse_date(raw) {
            Some(date) => Some(date),
            None => bail!("--date must be YYYY-MM-DD, got '{raw}'"),
        },
    };
    Ok(ReservationFilter {
        table_number: table,
        date,
    })
}

/// Fetch the sorted listing for `filter`.
pub fn fetch(db_path: &Path, filter: &ReservationFilter) -> Result<Vec<Reservation>> {
    let coordinator = open_existing(db_path)?;
    Ok(coordinator.list_reservations(filter)?)
}

/// Print the listing to `out`.
pub fn handle_list<W: Write>(
    out: &mut W,
    db_path: &Path,
    filter: &ReservationFilter,
    format: OutputFormat,
) -> Result<()> {
    let reservations = fetch(db_path, filter)?;
    let palette = match format {
        OutputFormat::Text => ColorPalette::detect(),
        OutputFormat::Json => ColorPalette::plain(),
    };
    write_reservations(out, &reservations, format, palette).context("failed to write listing")
}
