use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::error::{InsertError, StorageError};
use crate::model::{ConflictKey, Reservation, ReservationFilter, TableNumber};
use crate::store::ReservationRepository;

/// Process-local repository guarded by a single mutex.
///
/// The overlap probe and the insert run under the same lock, which gives the
/// same all-or-nothing behaviour as the SQLite adapter.
#[derive(Debug, Default)]
pub struct InMemoryReservationRepository {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    partitions: BTreeMap<(TableNumber, NaiveDate), Vec<Reservation>>,
    conflict_keys: HashSet<ConflictKey>,
    idempotency_keys: HashSet<String>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed reservations.
    pub fn len(&self) -> usize {
        self.lock()
            .map(|state| state.partitions.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("reservation store lock poisoned".to_string()))
    }
}

impl ReservationRepository for InMemoryReservationRepository {
    fn find_by_table_and_date(
        &self,
        table_number: TableNumber,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .partitions
            .get(&(table_number, date))
            .cloned()
            .unwrap_or_default())
    }

    fn insert_if_no_conflict(
        &self,
        reservation: &Reservation,
        key: &ConflictKey,
    ) -> Result<(), InsertError> {
        let mut state = self.lock()?;

        let already_exists = || InsertError::AlreadyExists { key: key.clone() };

        if state.conflict_keys.contains(key) {
            return Err(already_exists());
        }
        if let Some(idempotency_key) = &reservation.idempotency_key {
            if state.idempotency_keys.contains(idempotency_key) {
                return Err(already_exists());
            }
        }
        let partition_key = (reservation.table_number, reservation.date);
        let overlapping = state
            .partitions
            .get(&partition_key)
            .is_some_and(|existing| existing.iter().any(|r| r.slot.overlaps(&reservation.slot)));
        if overlapping {
            return Err(already_exists());
        }

        state.conflict_keys.insert(key.clone());
        if let Some(idempotency_key) = &reservation.idempotency_key {
            state.idempotency_keys.insert(idempotency_key.clone());
        }
        state
            .partitions
            .entry(partition_key)
            .or_default()
            .push(reservation.clone());
        Ok(())
    }

    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .partitions
            .values()
            .flatten()
            .filter(|reservation| filter.matches(reservation))
            .cloned()
            .collect())
    }
}
