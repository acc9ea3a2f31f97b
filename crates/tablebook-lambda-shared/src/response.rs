//! Response wrapper for successful Lambda responses.

use serde::{Deserialize, Serialize};

/// Wrapper for successful Lambda payloads with content type metadata.
///
/// Mirrors the `content_type` member of `ProblemDetails`, so success and
/// error bodies share a shape.
///
/// # Example
///
/// ```
/// use tablebook_lambda_shared::LambdaResponse;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Created {
///     reservation_id: String,
/// }
///
/// let response = LambdaResponse::new(Created { reservation_id: "abc".into() });
/// assert_eq!(response.content_type, "application/json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LambdaResponse<T> {
    #[serde(flatten)]
    pub data: T,

    pub content_type: String,
}

impl<T> LambdaResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            content_type: "application/json".to_string(),
        }
    }
}

impl<T> From<T> for LambdaResponse<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}
