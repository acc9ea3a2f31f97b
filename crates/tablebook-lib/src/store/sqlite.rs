use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, Row, TransactionBehavior};
use tracing::debug;

use crate::db;
use crate::error::{InsertError, StorageError};
use crate::model::{
    format_date, format_time, parse_date, ConflictKey, Reservation, ReservationFilter,
    ReservationId, Slot, TableNumber,
};
use crate::store::ReservationRepository;

const SELECT_COLUMNS: &str = "SELECT id, table_number, date, slot_start, slot_end, client_name, \
                              phone_number, idempotency_key FROM reservations";

/// Reservation repository backed by a SQLite database file.
///
/// Each instance owns one connection. Independent workers open their own
/// instance on the same file; SQLite's write lock then serialises their
/// conditional inserts.
pub struct SqliteReservationRepository {
    conn: Mutex<Connection>,
}

impl SqliteReservationRepository {
    /// Open the database at `path`, creating the schema when missing.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    /// Private in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::from_connection(db::open_in_memory()?))
    }

    /// Wrap an existing connection. The schema must already be present.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("database connection lock poisoned".to_string()))
    }
}

impl ReservationRepository for SqliteReservationRepository {
    fn find_by_table_and_date(
        &self,
        table_number: TableNumber,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, StorageError> {
        let conn = self.lock()?;
        let sql = format!("{SELECT_COLUMNS} WHERE table_number = ?1 AND date = ?2");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![table_number, format_date(date)],
            RawReservation::from_row,
        )?;

        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?.decode()?);
        }
        Ok(reservations)
    }

    fn insert_if_no_conflict(
        &self,
        reservation: &Reservation,
        key: &ConflictKey,
    ) -> Result<(), InsertError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let date = format_date(reservation.date);
        let start = format_time(reservation.slot.start());
        let end = format_time(reservation.slot.end());

        let overlapping = {
            let mut probe = tx.prepare(
                "SELECT 1 FROM reservations
                 WHERE table_number = ?1 AND date = ?2 AND slot_start < ?4 AND ?3 < slot_end
                 LIMIT 1",
            )?;
            probe.exists(params![reservation.table_number, date, start, end])?
        };
        if overlapping {
            debug!(conflict_key = %key, "overlap probe rejected insert");
            return Err(InsertError::AlreadyExists { key: key.clone() });
        }

        let inserted = tx.execute(
            "INSERT INTO reservations (id, table_number, date, slot_start, slot_end, client_name,
                                       phone_number, conflict_key, idempotency_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                reservation.id.to_string(),
                reservation.table_number,
                date,
                start,
                end,
                reservation.client_name,
                reservation.phone_number,
                key.to_string(),
                reservation.idempotency_key,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(error, _))
                if error.code == ErrorCode::ConstraintViolation =>
            {
                debug!(conflict_key = %key, "unique constraint rejected insert");
                return Err(InsertError::AlreadyExists { key: key.clone() });
            }
            Err(error) => return Err(error.into()),
        }

        tx.commit()?;
        Ok(())
    }

    fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StorageError> {
        let conn = self.lock()?;
        let sql = format!(
            "{SELECT_COLUMNS} WHERE (?1 IS NULL OR table_number = ?1) AND (?2 IS NULL OR date = ?2) \
             ORDER BY table_number, slot_start, date, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![filter.table_number, filter.date.map(format_date)],
            RawReservation::from_row,
        )?;

        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?.decode()?);
        }
        Ok(reservations)
    }
}

/// Column values as stored, before domain validation.
struct RawReservation {
    id: String,
    table_number: TableNumber,
    date: String,
    slot_start: String,
    slot_end: String,
    client_name: String,
    phone_number: String,
    idempotency_key: Option<String>,
}

impl RawReservation {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            table_number: row.get(1)?,
            date: row.get(2)?,
            slot_start: row.get(3)?,
            slot_end: row.get(4)?,
            client_name: row.get(5)?,
            phone_number: row.get(6)?,
            idempotency_key: row.get(7)?,
        })
    }

    fn decode(self) -> Result<Reservation, StorageError> {
        let corrupt = |message: String| StorageError::Corrupt {
            id: self.id.clone(),
            message,
        };

        let id = self
            .id
            .parse::<ReservationId>()
            .map_err(|error| corrupt(format!("bad id: {error}")))?;
        let date = parse_date(&self.date).ok_or_else(|| corrupt(format!("bad date '{}'", self.date)))?;
        let slot = Slot::parse(&self.slot_start, &self.slot_end)
            .map_err(|error| corrupt(error.to_string()))?;

        Ok(Reservation {
            id,
            table_number: self.table_number,
            date,
            slot,
            client_name: self.client_name,
            phone_number: self.phone_number,
            idempotency_key: self.idempotency_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(table: TableNumber, day: u32, start: &str, end: &str) -> Reservation {
        Reservation {
            id: ReservationId::generate(),
            table_number: table,
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            slot: Slot::parse(start, end).unwrap(),
            client_name: "Guest".to_string(),
            phone_number: "555".to_string(),
            idempotency_key: None,
        }
    }

    fn insert(repo: &SqliteReservationRepository, r: &Reservation) -> Result<(), InsertError> {
        repo.insert_if_no_conflict(r, &r.conflict_key())
    }

    #[test]
    fn round_trips_reservations() {
        let repo = SqliteReservationRepository::open_in_memory().unwrap();
        let mut stored = reservation(5, 1, "18:00", "19:00");
        stored.idempotency_key = Some("k".to_string());
        insert(&repo, &stored).unwrap();

        let found = repo.find_by_table_and_date(5, stored.date).unwrap();
        assert_eq!(found, vec![stored]);
    }

    #[test]
    fn rejects_overlaps_duplicates_and_reused_keys() {
        let repo = SqliteReservationRepository::open_in_memory().unwrap();
        let mut first = reservation(5, 1, "18:00", "19:00");
        first.idempotency_key = Some("k".to_string());
        insert(&repo, &first).unwrap();

        for (start, end) in [("18:30", "19:30"), ("17:30", "18:30"), ("18:00", "18:15")] {
            assert!(matches!(
                insert(&repo, &reservation(5, 1, start, end)),
                Err(InsertError::AlreadyExists { .. })
            ));
        }

        let mut reused = reservation(9, 2, "10:00", "11:00");
        reused.idempotency_key = Some("k".to_string());
        assert!(matches!(
            insert(&repo, &reused),
            Err(InsertError::AlreadyExists { .. })
        ));

        assert_eq!(repo.list(&ReservationFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn back_to_back_slots_are_accepted() {
        let repo = SqliteReservationRepository::open_in_memory().unwrap();
        insert(&repo, &reservation(5, 1, "12:00", "13:00")).unwrap();
        insert(&repo, &reservation(5, 1, "13:00", "14:00")).unwrap();
        insert(&repo, &reservation(5, 1, "11:00", "12:00")).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(repo.find_by_table_and_date(5, date).unwrap().len(), 3);
    }

    #[test]
    fn list_filters_and_orders_rows() {
        let repo = SqliteReservationRepository::open_in_memory().unwrap();
        insert(&repo, &reservation(7, 1, "12:00", "13:00")).unwrap();
        insert(&repo, &reservation(2, 2, "09:00", "10:00")).unwrap();
        insert(&repo, &reservation(2, 1, "20:00", "21:00")).unwrap();

        let all = repo.list(&ReservationFilter::default()).unwrap();
        let order: Vec<_> = all
            .iter()
            .map(|r| (r.table_number, r.slot.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                (2, "09:00-10:00".to_string()),
                (2, "20:00-21:00".to_string()),
                (7, "12:00-13:00".to_string()),
            ]
        );

        let filtered = repo
            .list(&ReservationFilter {
                table_number: Some(2),
                date: NaiveDate::from_ymd_opt(2024, 6, 1),
            })
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].slot.to_string(), "20:00-21:00");
    }

    #[test]
    fn corrupt_rows_surface_as_storage_errors() {
        let repo = SqliteReservationRepository::open_in_memory().unwrap();
        {
            let conn = repo.lock().unwrap();
            conn.execute(
                "INSERT INTO reservations (id, table_number, date, slot_start, slot_end, client_name,
                                           phone_number, conflict_key)
                 VALUES ('not-a-uuid', 1, '2024-06-01', '10:00', '11:00', 'x', 'y', 'k')",
                [],
            )
            .unwrap();
        }
        let error = repo.list(&ReservationFilter::default()).unwrap_err();
        assert!(matches!(error, StorageError::Corrupt { .. }));
    }
}
