//! Durable reservation storage consumed by the booking coordinator.
//!
//! Two adapters are provided: [`SqliteReservationRepository`] for deployed
//! functions and services, and [`InMemoryReservationRepository`] for tests and
//! local experiments. Both implement the same atomic conditional insert.

mod memory;
mod sqlite;

pub use memory::InMemoryReservationRepository;
pub use sqlite::SqliteReservationRepository;

use chrono::NaiveDate;

use crate::error::{InsertError, StorageError};
use crate::model::{ConflictKey, Reservation, ReservationFilter, TableNumber};

/// Keyed reservation storage with an atomic conditional insert.
///
/// Implementations must be safe to share between concurrently running
/// workers; the conditional insert is the only mutation.
pub trait ReservationRepository: Send + Sync {
    /// All committed reservations for one table on one date.
    ///
    /// Must reflect every write previously acknowledged to this caller.
    fn find_by_table_and_date(
        &self,
        table_number: TableNumber,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StorageError>;

    /// Insert `reservation` in a single atomic step, or reject it.
    ///
    /// Rejects with [`InsertError::AlreadyExists`] when `key` is occupied, when
    /// a committed reservation for the same table and date overlaps the slot,
    /// or when the reservation's idempotency key is already in use. A rejected
    /// or failed call leaves no trace in storage.
    fn insert_if_no_conflict(
        &self,
        reservation: &Reservation,
        key: &ConflictKey,
    ) -> Result<(), InsertError>;

    /// Reservations matching `filter`, in no particular order.
    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError>;
}
