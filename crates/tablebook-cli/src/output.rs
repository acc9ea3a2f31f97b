//! Rendering of reservation listings.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use tablebook_lib::Reservation;

use crate::terminal::ColorPalette;

/// Output format for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One aligned line per reservation.
    #[default]
    Text,
    /// `{"reservations": [...]}`, the same shape the HTTP endpoints return.
    Json,
}

#[derive(Serialize)]
struct Listing<'a> {
    reservations: &'a [Reservation],
}

/// Write `reservations` (already sorted) to `out` in `format`.
pub fn write_reservations<W: Write>(
    out: &mut W,
    reservations: &[Reservation],
    format: OutputFormat,
    palette: ColorPalette,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &Listing { reservations })?;
            writeln!(out)
        }
        OutputFormat::Text => write_text(out, reservations, palette),
    }
}

fn write_text<W: Write>(
    out: &mut W,
    reservations: &[Reservation],
    palette: ColorPalette,
) -> io::Result<()> {
    if reservations.is_empty() {
        return writeln!(out, "No reservations found.");
    }

    let ColorPalette {
        reset,
        white_bold,
        green,
        gray,
    } = palette;

    writeln!(out, "Reservations ({}):", reservations.len())?;
    writeln!(
        out,
        "{:>6}  {:<10}  {:<11}  {:<20}  {:<16}  {}",
        "Table", "Date", "Slot", "Client", "Phone", "Id"
    )?;
    for reservation in reservations {
        writeln!(
            out,
            "{white_bold}{:>6}{reset}  {:<10}  {green}{:<11}{reset}  {:<20}  {:<16}  {gray}{}{reset}",
            reservation.table_number,
            reservation.date,
            reservation.slot.to_string(),
            reservation.client_name,
            reservation.phone_number,
            reservation.id,
        )?;
    }
    Ok(())
}
