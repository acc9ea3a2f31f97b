//! Booking request as received from callers, and its validated form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::model::{
    parse_date, ConflictKey, InvalidSlot, Reservation, ReservationId, Slot, TableNumber,
};

/// Upper bound on client-supplied idempotency keys.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Request to book a table, in wire form.
///
/// Every field is optional at this level so that missing fields surface as
/// [`BookingError::Validation`] rather than as a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<i64>,

    /// Calendar date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Slot start, `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_time_start: Option<String>,

    /// Slot end (exclusive), `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_time_end: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Retried requests carrying the same key resolve to the same reservation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl CreateReservationRequest {
    /// Convenience constructor with every required field populated.
    pub fn new(
        table_number: i64,
        date: impl Into<String>,
        slot_time_start: impl Into<String>,
        slot_time_end: impl Into<String>,
        client_name: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            table_number: Some(table_number),
            date: Some(date.into()),
            slot_time_start: Some(slot_time_start.into()),
            slot_time_end: Some(slot_time_end.into()),
            client_name: Some(client_name.into()),
            phone_number: Some(phone_number.into()),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Check presence and shape of every field.
    pub fn validate(&self) -> Result<NewReservation> {
        let table_number = match self.table_number {
            None => return Err(BookingError::validation("tableNumber", "is required")),
            Some(value) => TableNumber::try_from(value)
                .ok()
                .filter(|number| *number > 0)
                .ok_or_else(|| {
                    BookingError::validation("tableNumber", "must be a positive integer")
                })?,
        };

        let date = required("date", self.date.as_deref())?;
        let date = parse_date(date).ok_or_else(|| {
            BookingError::validation("date", format!("'{date}' is not a YYYY-MM-DD date"))
        })?;

        let start = required("slotTimeStart", self.slot_time_start.as_deref())?;
        let end = required("slotTimeEnd", self.slot_time_end.as_deref())?;
        let slot = Slot::parse(start, end).map_err(|error| match error {
            InvalidSlot::Start(_) => BookingError::validation("slotTimeStart", error.to_string()),
            InvalidSlot::End(_) | InvalidSlot::Empty { .. } => {
                BookingError::validation("slotTimeEnd", error.to_string())
            }
        })?;

        let client_name = required("clientName", self.client_name.as_deref())?.to_string();
        let phone_number = required("phoneNumber", self.phone_number.as_deref())?.to_string();

        let idempotency_key = match self.idempotency_key.as_deref().map(str::trim) {
            None => None,
            Some("") => {
                return Err(BookingError::validation(
                    "idempotencyKey",
                    "cannot be empty when provided",
                ))
            }
            Some(key) if key.len() > MAX_IDEMPOTENCY_KEY_LEN => {
                return Err(BookingError::validation(
                    "idempotencyKey",
                    format!("must be at most {MAX_IDEMPOTENCY_KEY_LEN} characters"),
                ))
            }
            Some(key) => Some(key.to_string()),
        };

        Ok(NewReservation {
            table_number,
            date,
            slot,
            client_name,
            phone_number,
            idempotency_key,
        })
    }
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(BookingError::validation(field, "is required")),
    }
}

/// A validated booking that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub table_number: TableNumber,
    pub date: NaiveDate,
    pub slot: Slot,
    pub client_name: String,
    pub phone_number: String,
    pub idempotency_key: Option<String>,
}

impl NewReservation {
    pub fn conflict_key(&self) -> ConflictKey {
        ConflictKey::new(self.table_number, self.date, &self.slot)
    }

    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            table_number: self.table_number,
            date: self.date,
            slot: self.slot,
            client_name: self.client_name,
            phone_number: self.phone_number,
            idempotency_key: self.idempotency_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn valid() -> CreateReservationRequest {
        CreateReservationRequest::new(5, "2024-06-01", "18:00", "19:00", "A", "555")
    }

    fn field_of(error: BookingError) -> &'static str {
        match error {
            BookingError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_passes() {
        let booking = valid().validate().expect("valid");
        assert_eq!(booking.table_number, 5);
        assert_eq!(booking.slot.to_string(), "18:00-19:00");
        assert_eq!(booking.conflict_key().to_string(), "5|2024-06-01|18:00");
        assert!(booking.idempotency_key.is_none());
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let cases: [(&str, fn(&mut CreateReservationRequest)); 6] = [
            ("tableNumber", |r| r.table_number = None),
            ("date", |r| r.date = None),
            ("slotTimeStart", |r| r.slot_time_start = None),
            ("slotTimeEnd", |r| r.slot_time_end = None),
            ("clientName", |r| r.client_name = Some("   ".to_string())),
            ("phoneNumber", |r| r.phone_number = None),
        ];

        for (expected, mutate) in cases {
            let mut request = valid();
            mutate(&mut request);
            let error = request.validate().unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Validation);
            assert_eq!(field_of(error), expected);
        }
    }

    #[test]
    fn non_positive_table_numbers_are_rejected() {
        for number in [0, -3, i64::from(u32::MAX) + 1] {
            let mut request = valid();
            request.table_number = Some(number);
            assert_eq!(field_of(request.validate().unwrap_err()), "tableNumber");
        }
    }

    #[test]
    fn malformed_times_and_dates_are_rejected() {
        let mut request = valid();
        request.slot_time_start = Some("6pm".to_string());
        assert_eq!(field_of(request.validate().unwrap_err()), "slotTimeStart");

        let mut request = valid();
        request.date = Some("01/06/2024".to_string());
        assert_eq!(field_of(request.validate().unwrap_err()), "date");
    }

    #[test]
    fn zero_length_and_inverted_slots_are_rejected() {
        let mut request = valid();
        request.slot_time_end = Some("18:00".to_string());
        assert_eq!(field_of(request.validate().unwrap_err()), "slotTimeEnd");

        let mut request = valid();
        request.slot_time_end = Some("17:00".to_string());
        assert_eq!(field_of(request.validate().unwrap_err()), "slotTimeEnd");
    }

    #[test]
    fn idempotency_key_is_trimmed_and_bounded() {
        let booking = valid()
            .with_idempotency_key("  retry-1 ")
            .validate()
            .unwrap();
        assert_eq!(booking.idempotency_key.as_deref(), Some("retry-1"));

        let error = valid().with_idempotency_key(" ").validate().unwrap_err();
        assert_eq!(field_of(error), "idempotencyKey");

        let error = valid()
            .with_idempotency_key("k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1))
            .validate()
            .unwrap_err();
        assert_eq!(field_of(error), "idempotencyKey");
    }

    #[test]
    fn deserializes_wire_body() {
        let request: CreateReservationRequest = serde_json::from_str(
            r#"{"tableNumber":5,"date":"2024-06-01","slotTimeStart":"18:00","slotTimeEnd":"19:00","clientName":"A","phoneNumber":"555"}"#,
        )
        .unwrap();
        assert_eq!(request, valid());
    }
}
