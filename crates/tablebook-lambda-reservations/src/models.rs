use serde::{Deserialize, Serialize};

use tablebook_lambda_shared::{ApiGatewayRequest, ProblemDetails};
use tablebook_lib::model::parse_date;
use tablebook_lib::{Reservation, ReservationFilter, TableNumber};

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

/// Read the optional `tableNumber` and `date` query parameters.
pub fn filter_from_query(
    request: &ApiGatewayRequest,
    request_id: &str,
) -> Result<ReservationFilter, Box<ProblemDetails>> {
    let table_number = match request.query("tableNumber").map(str::trim) {
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

    let date = match request.query("date").map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_date(raw) {
            Some(date) => Some(date),
            None => {
                return Err(Box::new(ProblemDetails::bad_request(
                    format!("date must be YYYY-MM-DD, got '{raw}'"),
                    request_id,
                )))
            }
        },
    };

    Ok(ReservationFilter { table_number, date })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn get(params: &[(&str, &str)]) -> ApiGatewayRequest {
        ApiGatewayRequest {
            http_method: "GET".to_string(),
            path: "/reservations".to_string(),
            body: None,
            query_string_parameters: Some(
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<HashMap<_, _>>(),
            ),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let filter = filter_from_query(&get(&[]), "r").unwrap();
        assert_eq!(filter, ReservationFilter::default());
    }

    #[test]
    fn parses_table_and_date() {
        let filter = filter_from_query(&get(&[("tableNumber", "5"), ("date", "2024-06-01")]), "r")
            .unwrap();
        assert_eq!(filter.table_number, Some(5));
        assert_eq!(filter.date.map(|d| d.to_string()).as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn rejects_malformed_values() {
        let problem = filter_from_query(&get(&[("tableNumber", "five")]), "r").unwrap_err();
        assert_eq!(problem.status, 400);

        let problem = filter_from_query(&get(&[("date", "June 1st")]), "r").unwrap_err();
        assert!(problem.detail.as_deref().unwrap().contains("YYYY-MM-DD"));
    }
}
