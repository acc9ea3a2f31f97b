use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::availability;

/// Number printed on a dining table; the catalog's primary key.
pub type TableNumber = u32;

/// Wire and storage format for times of day.
pub const TIME_FORMAT: &str = "%H:%M";

/// Wire and storage format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `HH:MM` (24h, zero padded) time of day.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Globally unique reservation identifier, generated once at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ReservationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Reasons a pair of time strings does not form a bookable slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSlot {
    #[error("start time '{0}' is not a valid HH:MM time")]
    Start(String),

    #[error("end time '{0}' is not a valid HH:MM time")]
    End(String),

    #[error("slot end {end} must be later than slot start {start}")]
    Empty { start: String, end: String },
}

/// Half-open time interval `[start, end)` on a single calendar day.
///
/// Construction guarantees `start < end`; zero-length and inverted slots
/// cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SlotRepr", into = "SlotRepr")]
pub struct Slot {
    start: NaiveTime,
    end: NaiveTime,
}

impl Slot {
    /// Build a slot, returning `None` unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Parse a slot from `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, InvalidSlot> {
        let start_time = parse_time(start).ok_or_else(|| InvalidSlot::Start(start.to_string()))?;
        let end_time = parse_time(end).ok_or_else(|| InvalidSlot::End(end.to_string()))?;
        Self::new(start_time, end_time).ok_or_else(|| InvalidSlot::Empty {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether this slot shares any instant with `other`. Touching slots
    /// (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &Slot) -> bool {
        availability::overlaps(self, other)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_time(self.start), format_time(self.end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotRepr {
    #[serde(rename = "slotTimeStart")]
    start: String,
    #[serde(rename = "slotTimeEnd")]
    end: String,
}

impl TryFrom<SlotRepr> for Slot {
    type Error = InvalidSlot;

    fn try_from(repr: SlotRepr) -> Result<Self, Self::Error> {
        Slot::parse(&repr.start, &repr.end)
    }
}

impl From<Slot> for SlotRepr {
    fn from(slot: Slot) -> Self {
        Self {
            start: format_time(slot.start),
            end: format_time(slot.end),
        }
    }
}

/// A bookable table as owned by the table catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub number: TableNumber,
    #[serde(alias = "places")]
    pub capacity: u32,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub min_order: f64,
}

/// A committed reservation. Never mutated after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ReservationId,
    pub table_number: TableNumber,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub slot: Slot,
    pub client_name: String,
    pub phone_number: String,
    /// Client retry token. Kept in storage, never written to listings.
    #[serde(default, skip_serializing)]
    pub idempotency_key: Option<String>,
}

impl Reservation {
    pub fn conflict_key(&self) -> ConflictKey {
        ConflictKey::new(self.table_number, self.date, &self.slot)
    }
}

/// Storage key used by the conditional insert to reject duplicate bookings
/// of the same table, date and start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConflictKey {
    pub table_number: TableNumber,
    pub date: NaiveDate,
    pub slot_start: NaiveTime,
}

impl ConflictKey {
    pub fn new(table_number: TableNumber, date: NaiveDate, slot: &Slot) -> Self {
        Self {
            table_number,
            date,
            slot_start: slot.start(),
        }
    }
}

impl fmt::Display for ConflictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.table_number,
            format_date(self.date),
            format_time(self.slot_start)
        )
    }
}

/// Optional table/date restriction for reservation listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub table_number: Option<TableNumber>,
    pub date: Option<NaiveDate>,
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.table_number
            .is_none_or(|number| number == reservation.table_number)
            && self.date.is_none_or(|date| date == reservation.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parse_time_requires_zero_padding() {
        assert_eq!(parse_time("09:30"), Some(time(9, 30)));
        assert_eq!(parse_time("9:30"), None);
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("18:00:00"), None);
        assert_eq!(parse_time("ab:cd"), None);
    }

    #[test]
    fn parse_date_is_strict() {
        assert_eq!(
            parse_date("2024-06-01"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(parse_date("2024-6-1"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn slot_rejects_empty_and_inverted_intervals() {
        assert!(Slot::new(time(18, 0), time(18, 0)).is_none());
        assert!(Slot::new(time(19, 0), time(18, 0)).is_none());
        assert!(Slot::new(time(18, 0), time(19, 0)).is_some());

        assert!(matches!(
            Slot::parse("19:00", "18:00"),
            Err(InvalidSlot::Empty { .. })
        ));
        assert!(matches!(Slot::parse("7pm", "20:00"), Err(InvalidSlot::Start(_))));
        assert!(matches!(Slot::parse("19:00", ""), Err(InvalidSlot::End(_))));
    }

    #[test]
    fn slot_display_uses_hh_mm() {
        let slot = Slot::parse("18:00", "19:30").unwrap();
        assert_eq!(slot.to_string(), "18:00-19:30");
    }

    #[test]
    fn conflict_key_display() {
        let slot = Slot::parse("18:00", "19:00").unwrap();
        let key = ConflictKey::new(5, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), &slot);
        assert_eq!(key.to_string(), "5|2024-06-01|18:00");
    }

    #[test]
    fn reservation_serializes_with_wire_field_names() {
        let reservation = Reservation {
            id: ReservationId::generate(),
            table_number: 5,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            slot: Slot::parse("18:00", "19:00").unwrap(),
            client_name: "A".to_string(),
            phone_number: "555".to_string(),
            idempotency_key: None,
        };

        let json = serde_json::to_value(&reservation).unwrap();
        assert_eq!(json["tableNumber"], 5);
        assert_eq!(json["date"], "2024-06-01");
        assert_eq!(json["slotTimeStart"], "18:00");
        assert_eq!(json["slotTimeEnd"], "19:00");
        assert_eq!(json["clientName"], "A");
        assert!(json.get("idempotencyKey").is_none());

        let back: Reservation = serde_json::from_value(json).unwrap();
        assert_eq!(back, reservation);
    }

    #[test]
    fn idempotency_key_stays_out_of_serialized_reservations() {
        let reservation = Reservation {
            id: ReservationId::generate(),
            table_number: 5,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            slot: Slot::parse("18:00", "19:00").unwrap(),
            client_name: "A".to_string(),
            phone_number: "555".to_string(),
            idempotency_key: Some("secret-token".to_string()),
        };

        let json = serde_json::to_string(&reservation).unwrap();
        assert!(!json.contains("idempotencyKey"), "{json}");
        assert!(!json.contains("secret-token"), "{json}");
    }

    #[test]
    fn table_accepts_places_alias() {
        let table: Table =
            serde_json::from_str(r#"{"number": 5, "places": 4, "isVip": true, "minOrder": 20.5}"#)
                .unwrap();
        assert_eq!(table.capacity, 4);
        assert!(table.is_vip);
    }

    #[test]
    fn filter_matches_optional_fields() {
        let reservation = Reservation {
            id: ReservationId::generate(),
            table_number: 2,
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            slot: Slot::parse("12:00", "13:00").unwrap(),
            client_name: "B".to_string(),
            phone_number: "1".to_string(),
            idempotency_key: None,
        };

        assert!(ReservationFilter::default().matches(&reservation));
        assert!(ReservationFilter {
            table_number: Some(2),
            date: None
        }
        .matches(&reservation));
        assert!(!ReservationFilter {
            table_number: Some(3),
            date: None
        }
        .matches(&reservation));
        assert!(!ReservationFilter {
            table_number: None,
            date: NaiveDate::from_ymd_opt(2024, 6, 2)
        }
        .matches(&reservation));
    }
}
