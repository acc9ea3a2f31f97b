//! Success envelope mirroring [`crate::ProblemDetails`].

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Successful response body: the payload's fields plus `content_type`.
///
/// ```
/// use serde::Serialize;
/// use tablebook_service_shared::ServiceResponse;
///
/// #[derive(Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Created {
///     reservation_id: String,
/// }
///
/// let body = ServiceResponse::new(Created { reservation_id: "abc".into() });
/// let json = serde_json::to_value(&body).unwrap();
/// assert_eq!(json["reservationId"], "abc");
/// assert_eq!(json["content_type"], "application/json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    #[serde(flatten)]
    pub data: T,

    pub content_type: String,
}

impl<T> ServiceResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            content_type: "application/json".to_string(),
        }
    }
}

impl<T> From<T> for ServiceResponse<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
