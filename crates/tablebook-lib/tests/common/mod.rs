//! Common test utilities and storage fakes.
//!
//! Provides temporary on-disk databases seeded with dining tables, plus
//! repository wrappers that count calls or inject storage failures.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tablebook_lib::{
    db, BookingCoordinator, ConflictKey, CreateReservationRequest, InMemoryReservationRepository,
    InMemoryTableCatalog, InsertError, Reservation, ReservationFilter, ReservationRepository,
    RetryPolicy, StorageError, Table, TableNumber,
};
use tempfile::TempDir;

/// Temporary SQLite database with the schema and a set of tables in place.
pub struct TestDb {
    /// Temp directory (dropped on struct drop)
    _temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestDb {
    pub fn with_tables(numbers: &[TableNumber]) -> Self {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_dir.path().join("reservations.db");
        let mut conn = db::open_database(&path).expect("open database");
        let tables: Vec<Table> = numbers
            .iter()
            .map(|&number| Table {
                number,
                capacity: 4,
                is_vip: false,
                min_order: 0.0,
            })
            .collect();
        db::import_tables(&mut conn, &tables).expect("seed tables");

        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    /// A coordinator with its own connections, as an independent worker has.
    pub fn coordinator(&self) -> BookingCoordinator {
        BookingCoordinator::open(&self.path)
            .expect("open coordinator")
            .with_retry_policy(RetryPolicy::default())
    }
}

pub fn booking(table: i64, start: &str, end: &str) -> CreateReservationRequest {
    CreateReservationRequest::new(table, "2024-06-01", start, end, "A", "555")
}

pub fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

#[allow(dead_code)]
pub fn in_memory_coordinator(
    repository: Arc<dyn ReservationRepository>,
    tables: &[TableNumber],
) -> BookingCoordinator {
    BookingCoordinator::new(
        repository,
        Arc::new(InMemoryTableCatalog::with_numbers(tables.iter().copied())),
    )
    .with_retry_policy(RetryPolicy::immediate(3))
}

/// Repository wrapper that records how often it is read and written.
#[derive(Default)]
#[allow(dead_code)]
pub struct CountingRepository {
    inner: InMemoryReservationRepository,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl ReservationRepository for CountingRepository {
    fn find_by_table_and_date(
        &self,
        table_number: TableNumber,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_table_and_date(table_number, date)
    }

    fn insert_if_no_conflict(
        &self,
        reservation: &Reservation,
        key: &ConflictKey,
    ) -> Result<(), InsertError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_if_no_conflict(reservation, key)
    }

    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list(filter)
    }
}

/// Repository whose conditional insert fails a fixed number of times before
/// delegating to an in-memory store.
#[allow(dead_code)]
pub struct FlakyRepository {
    inner: InMemoryReservationRepository,
    failures_left: AtomicU32,
    transient: bool,
    pub insert_calls: AtomicU32,
}

#[allow(dead_code)]
impl FlakyRepository {
    pub fn transient(failures: u32) -> Self {
        Self::build(failures, true)
    }

    pub fn fatal(failures: u32) -> Self {
        Self::build(failures, false)
    }

    fn build(failures: u32, transient: bool) -> Self {
        Self {
            inner: InMemoryReservationRepository::new(),
            failures_left: AtomicU32::new(failures),
            transient,
            insert_calls: AtomicU32::new(0),
        }
    }

    pub fn stored(&self) -> usize {
        self.inner.len()
    }
}

impl ReservationRepository for FlakyRepository {
    fn find_by_table_and_date(
        &self,
        table_number: TableNumber,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StorageError> {
        self.inner.find_by_table_and_date(table_number, date)
    }

    fn insert_if_no_conflict(
        &self,
        reservation: &Reservation,
        key: &ConflictKey,
    ) -> Result<(), InsertError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            let error = if self.transient {
                StorageError::Unavailable("simulated outage".to_string())
            } else {
                StorageError::Corrupt {
                    id: reservation.id.to_string(),
                    message: "simulated corruption".to_string(),
                }
            };
            return Err(InsertError::Storage(error));
        }
        self.inner.insert_if_no_conflict(reservation, key)
    }

    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        self.inner.list(filter)
    }
}

/// Repository whose next partition read can be made to miss committed
/// reservations, so a booking passes the pre-check and hits the
/// conditional insert as the loser of a race.
#[derive(Default)]
#[allow(dead_code)]
pub struct StaleReadRepository {
    inner: InMemoryReservationRepository,
    stale_reads: AtomicU32,
    pub reads: AtomicUsize,
    pub insert_calls: AtomicUsize,
}

#[allow(dead_code)]
impl StaleReadRepository {
    /// Make the next partition read come back empty and reset the counters.
    pub fn hide_next_read(&self) {
        self.stale_reads.store(1, Ordering::SeqCst);
        self.reads.store(0, Ordering::SeqCst);
        self.insert_calls.store(0, Ordering::SeqCst);
    }

    pub fn stored(&self) -> usize {
        self.inner.len()
    }
}

impl ReservationRepository for StaleReadRepository {
    fn find_by_table_and_date(
        &self,
        table_number: TableNumber,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let stale = self
            .stale_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(Vec::new());
        }
        self.inner.find_by_table_and_date(table_number, date)
    }

    fn insert_if_no_conflict(
        &self,
        reservation: &Reservation,
        key: &ConflictKey,
    ) -> Result<(), InsertError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_if_no_conflict(reservation, key)
    }

    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        self.inner.list(filter)
    }
}
