use serde::{Deserialize, Serialize};

use tablebook_lib::model::parse_date;
use tablebook_lib::{Reservation, ReservationFilter, TableNumber};
use tablebook_service_shared::ProblemDetails;

/// Body returned for a committed booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReservationDto {
    pub reservation_id: String,
}

/// Body returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationListDto {
    pub reservations: Vec<Reservation>,
}

/// Raw `GET /reservations` query string. Values stay strings so a bad one
/// becomes a problem document instead of axum's plain-text rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub table_number: Option<String>,
    pub date: Option<String>,
}

impl ListQuery {
    pub fn into_filter(self, request_id: &str) -> Result<ReservationFilter, Box<ProblemDetails>> {
        let table_number = match self.table_number.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<TableNumber>() {
                Ok(number) if number > 0 => Some(number),
                _ => {
                    return Err(Box::new(ProblemDetails::bad_request(
                        format!("tableNumber must be a positive integer, got '{raw}'"),
                        request_id,
                    )))
                }
            },
        };

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date(raw).ok_or_else(|| {
                Box::new(ProblemDetails::bad_request(
                    format!("date must be YYYY-MM-DD, got '{raw}'"),
                    request_id,
                ))
            })?),
        };

        Ok(ReservationFilter { table_number, date })
    }
}
