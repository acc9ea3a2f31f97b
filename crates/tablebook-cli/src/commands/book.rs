//! `book`: commit a single reservation.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use tablebook_lib::{BookingError, Cancellation, CreateReservationRequest, ReservationId};

use super::open_existing;

/// Arguments of `book`, as typed on the command line.
#[derive(Debug, Clone)]
pub struct BookArgs {
    pub table: i64,
    pub date: String,
    pub start: String,
    pub end: String,
    pub name: String,
    pub phone: String,
    pub idempotency_key: Option<String>,
}

impl BookArgs {
    fn to_request(&self) -> CreateReservationRequest {
        let request = CreateReservationRequest::new(
            self.table,
            &self.date,
            &self.start,
            &self.end,
            &self.name,
            &self.phone,
        );
        match &self.idempotency_key {
            Some(key) => request.with_idempotency_key(key),
            None => request,
        }
    }
}

/// Book a table. Booking rejections come back as [`BookingError`] inside the
/// `anyhow` chain so `main` can pick the exit code.
pub fn handle_book(db_path: &Path, args: &BookArgs) -> Result<ReservationId> {
    let coordinator = open_existing(db_path)?;
    let request = args.to_request();
    debug!(table = args.table, date = %args.date, "booking from the command line");

    let id = coordinator.create_reservation(&request, &Cancellation::new())?;
    Ok(id)
}

/// Process exit code for a failed command.
///
/// 2 invalid input, 3 slot already taken, 4 unknown table, 1 anything else.
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<BookingError>() {
        Some(BookingError::Validation { .. }) => 2,
        Some(BookingError::Conflict { .. }) => 3,
        Some(BookingError::TableNotFound { .. }) => 4,
        _ => 1,
    }
}
