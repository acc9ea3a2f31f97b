//! The booking coordinator: validation, availability and atomic commit.
//!
//! Each call to [`BookingCoordinator::create_reservation`] walks the stages in
//! [`BookingStage`] exactly once and ends either committed or rejected. The
//! in-memory availability scan is only a pre-check; the repository's
//! conditional insert decides the outcome when requests race.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::availability::find_conflict;
use crate::cancel::Cancellation;
use crate::catalog::{SqliteTableCatalog, TableCatalog};
use crate::error::{BookingError, InsertError, Result, StorageError};
use crate::model::{Reservation, ReservationFilter, ReservationId, Slot};
use crate::request::{CreateReservationRequest, NewReservation};
use crate::retry::RetryPolicy;
use crate::store::{ReservationRepository, SqliteReservationRepository};

/// Where a booking request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStage {
    Validating,
    CheckingTable,
    CheckingAvailability,
    Committing,
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStage::Validating => "validating",
            BookingStage::CheckingTable => "checking_table",
            BookingStage::CheckingAvailability => "checking_availability",
            BookingStage::Committing => "committing",
        };
        f.write_str(name)
    }
}

/// Why a single attempt did not commit.
enum Attempt {
    /// Deterministic outcome; never retried.
    Rejected(BookingError),
    /// Storage failure; retried when transient.
    Storage(StorageError),
}

impl From<StorageError> for Attempt {
    fn from(error: StorageError) -> Self {
        Attempt::Storage(error)
    }
}

/// Orchestrates reservation requests against injected storage.
#[derive(Clone)]
pub struct BookingCoordinator {
    repository: Arc<dyn ReservationRepository>,
    catalog: Arc<dyn TableCatalog>,
    retry: RetryPolicy,
}

impl fmt::Debug for BookingCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingCoordinator")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl BookingCoordinator {
    /// Coordinator with the default [`RetryPolicy`].
    pub fn new(
        repository: Arc<dyn ReservationRepository>,
        catalog: Arc<dyn TableCatalog>,
    ) -> Self {
        Self {
            repository,
            catalog,
            retry: RetryPolicy::default(),
        }
    }

    /// Coordinator backed by the SQLite database at `path`, with the retry
    /// policy taken from the environment.
    pub fn open(path: &Path) -> std::result::Result<Self, StorageError> {
        let repository = SqliteReservationRepository::open(path)?;
        let catalog = SqliteTableCatalog::open(path)?;
        Ok(Self::new(Arc::new(repository), Arc::new(catalog))
            .with_retry_policy(RetryPolicy::from_env()))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn repository(&self) -> &Arc<dyn ReservationRepository> {
        &self.repository
    }

    pub fn catalog(&self) -> &Arc<dyn TableCatalog> {
        &self.catalog
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Book a table, returning the id of the committed reservation.
    ///
    /// Validation failures never touch storage, and an unknown table never
    /// reaches the repository. Transient storage failures are retried per the
    /// configured [`RetryPolicy`]; an `AlreadyExists` rejection is not.
    /// When `cancellation` fires before the conditional insert is issued, the
    /// call returns [`BookingError::Cancelled`] without writing.
    pub fn create_reservation(
        &self,
        request: &CreateReservationRequest,
        cancellation: &Cancellation,
    ) -> Result<ReservationId> {
        debug!(stage = %BookingStage::Validating, "booking request received");
        let booking = request.validate()?;

        if cancellation.is_cancelled() {
            return Err(BookingError::Cancelled);
        }

        debug!(
            stage = %BookingStage::CheckingTable,
            table_number = booking.table_number,
            "looking up table"
        );
        let table_number = booking.table_number;
        let exists = self.with_retries(cancellation, |_| Ok(self.catalog.exists(table_number)?))?;
        if !exists {
            info!(table_number, "booking rejected: unknown table");
            return Err(BookingError::TableNotFound { table_number });
        }

        let outcome = self.with_retries(cancellation, |attempt| {
            self.check_and_commit(&booking, cancellation, attempt)
        });

        match &outcome {
            Ok(id) => info!(
                reservation_id = %id,
                table_number,
                date = %booking.date,
                slot = %booking.slot,
                "reservation committed"
            ),
            Err(error) => info!(
                table_number,
                date = %booking.date,
                slot = %booking.slot,
                kind = %error.kind(),
                error = %error,
                "booking rejected"
            ),
        }
        outcome
    }

    /// Committed reservations matching `filter`, ordered by table number,
    /// slot start, date and id.
    pub fn list_reservations(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>> {
        let mut reservations =
            self.with_retries(&Cancellation::new(), |_| Ok(self.repository.list(filter)?))?;
        reservations.sort_by_key(|r| (r.table_number, r.slot.start(), r.date, r.id));
        Ok(reservations)
    }

    /// One pass of availability check and conditional insert.
    fn check_and_commit(
        &self,
        booking: &NewReservation,
        cancellation: &Cancellation,
        attempt: u32,
    ) -> std::result::Result<ReservationId, Attempt> {
        debug!(stage = %BookingStage::CheckingAvailability, attempt, "reading partition");
        let existing = self
            .repository
            .find_by_table_and_date(booking.table_number, booking.date)?;

        if let Some(id) = replayed(booking, &existing).map_err(Attempt::Rejected)? {
            debug!(reservation_id = %id, "idempotent replay of committed reservation");
            return Ok(id);
        }
        if let Some(slot) = find_conflict(&booking.slot, existing.iter().map(|r| &r.slot)) {
            return Err(Attempt::Rejected(conflict(booking, *slot)));
        }

        if cancellation.is_cancelled() {
            return Err(Attempt::Rejected(BookingError::Cancelled));
        }

        debug!(stage = %BookingStage::Committing, attempt, "issuing conditional insert");
        let id = ReservationId::generate();
        let reservation = booking.clone().into_reservation(id);
        match self
            .repository
            .insert_if_no_conflict(&reservation, &booking.conflict_key())
        {
            Ok(()) => Ok(id),
            Err(InsertError::AlreadyExists { key }) => {
                debug!(conflict_key = %key, "conditional insert lost the race");
                self.explain_lost_race(booking)
            }
            Err(InsertError::Storage(error)) => Err(Attempt::Storage(error)),
        }
    }

    /// Re-read the partition after a rejected insert to report what won.
    fn explain_lost_race(
        &self,
        booking: &NewReservation,
    ) -> std::result::Result<ReservationId, Attempt> {
        let existing = self
            .repository
            .find_by_table_and_date(booking.table_number, booking.date)?;

        if let Some(id) = replayed(booking, &existing).map_err(Attempt::Rejected)? {
            return Ok(id);
        }
        let cited = find_conflict(&booking.slot, existing.iter().map(|r| &r.slot))
            .copied()
            .unwrap_or(booking.slot);
        Err(Attempt::Rejected(conflict(booking, cited)))
    }

    fn with_retries<T, F>(&self, cancellation: &Cancellation, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> std::result::Result<T, Attempt>,
    {
        let max_attempts = self.retry.attempts();
        let mut attempt = 1;
        loop {
            let source = match op(attempt) {
                Ok(value) => return Ok(value),
                Err(Attempt::Rejected(error)) => return Err(error),
                Err(Attempt::Storage(source)) => source,
            };

            if !source.is_transient() || attempt >= max_attempts {
                warn!(attempt, error = %source, "storage failure, giving up");
                return Err(BookingError::Storage {
                    attempts: attempt,
                    source,
                });
            }

            let delay = self.retry.next_delay(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %source,
                "transient storage failure, retrying"
            );
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            if cancellation.is_cancelled() {
                return Err(BookingError::Cancelled);
            }
            attempt += 1;
        }
    }
}

/// Resolve a client retry against what is already committed.
///
/// Returns the stored id when the idempotency key matches a reservation for
/// the same slot. A matching key with a different slot is a conflict.
fn replayed(
    booking: &NewReservation,
    existing: &[Reservation],
) -> std::result::Result<Option<ReservationId>, BookingError> {
    let Some(key) = booking.idempotency_key.as_deref() else {
        return Ok(None);
    };
    match existing
        .iter()
        .find(|reservation| reservation.idempotency_key.as_deref() == Some(key))
    {
        None => Ok(None),
        Some(stored) if stored.slot == booking.slot => Ok(Some(stored.id)),
        Some(stored) => Err(conflict(booking, stored.slot)),
    }
}

fn conflict(booking: &NewReservation, existing: Slot) -> BookingError {
    BookingError::Conflict {
        table_number: booking.table_number,
        date: booking.date,
        existing,
    }
}
