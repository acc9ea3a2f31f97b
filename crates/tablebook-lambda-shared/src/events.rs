//! API Gateway proxy event and response shapes.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::problem::ProblemDetails;

/// The subset of an API Gateway proxy event the handlers read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayRequest {
    pub http_method: String,

    pub path: String,

    /// Raw body. API Gateway sends a JSON string; direct invocations may
    /// inline an object.
    #[serde(default)]
    pub body: Option<Value>,

    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

impl ApiGatewayRequest {
    /// Decode the body as `T`. A missing or empty body yields `None`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.body {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
            Some(Value::String(raw)) => serde_json::from_str(raw).map(Some),
            Some(other) => T::deserialize(other).map(Some),
        }
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }
}

/// API Gateway proxy response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ApiGatewayResponse {
    /// Serialize `payload` as a JSON response with the given status.
    pub fn json<T: Serialize>(status_code: u16, payload: &T) -> Self {
        Self::with_content_type(status_code, payload, "application/json")
    }

    pub fn problem(problem: &ProblemDetails) -> Self {
        Self::with_content_type(problem.status, problem, "application/problem+json")
    }

    fn with_content_type<T: Serialize>(status_code: u16, payload: &T, content_type: &str) -> Self {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(error) => {
                return Self {
                    status_code: 500,
                    headers: HashMap::from([(
                        "Content-Type".to_string(),
                        "text/plain".to_string(),
                    )]),
                    body: format!("failed to serialize response: {error}"),
                }
            }
        };
        Self {
            status_code,
            headers: HashMap::from([("Content-Type".to_string(), content_type.to_string())]),
            body,
        }
    }

    /// Parse the body back into JSON.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: i32,
    }

    #[test]
    fn body_may_be_string_or_object() {
        let stringly: ApiGatewayRequest = serde_json::from_value(json!({
            "httpMethod": "POST",
            "path": "/reservations",
            "body": "{\"value\": 1}"
        }))
        .unwrap();
        assert_eq!(
            stringly.json_body::<Payload>().unwrap(),
            Some(Payload { value: 1 })
        );

        let inline: ApiGatewayRequest = serde_json::from_value(json!({
            "httpMethod": "POST",
            "path": "/reservations",
            "body": {"value": 2}
        }))
        .unwrap();
        assert_eq!(
            inline.json_body::<Payload>().unwrap(),
            Some(Payload { value: 2 })
        );
    }

    #[test]
    fn empty_body_is_none_and_garbage_is_an_error() {
        let mut request = ApiGatewayRequest {
            http_method: "POST".to_string(),
            path: "/reservations".to_string(),
            ..Default::default()
        };
        assert_eq!(request.json_body::<Payload>().unwrap(), None);

        request.body = Some(Value::String("{oops".to_string()));
        assert!(request.json_body::<Payload>().is_err());
    }

    #[test]
    fn reads_query_parameters() {
        let request: ApiGatewayRequest = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/reservations",
            "queryStringParameters": {"tableNumber": "5"}
        }))
        .unwrap();
        assert_eq!(request.query("tableNumber"), Some("5"));
        assert_eq!(request.query("date"), None);
    }

    #[test]
    fn problem_response_carries_status_and_content_type() {
        let response = ApiGatewayResponse::problem(&ProblemDetails::bad_request("bad", "r"));
        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("application/problem+json")
        );
        assert_eq!(response.body_json().unwrap()["detail"], "bad");
    }
}
