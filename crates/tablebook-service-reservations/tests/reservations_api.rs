use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use tablebook_service_reservations::router;
use tablebook_service_shared::test_utils::{booking_body, test_state, TestDatabase};

fn server(tables: &[u32]) -> (TestDatabase, TestServer) {
    let (database, state) = test_state(tables);
    let server = TestServer::new(router(state)).expect("test server starts");
    (database, server)
}

#[tokio::test]
async fn booking_then_overlap_is_conflict() {
    let (_db, server) = server(&[5]);

    let created = server
        .post("/reservations")
        .json(&booking_body(5, "18:00", "19:00"))
        .await;
    created.assert_status_ok();
    let body: Value = created.json();
    assert!(body["reservationId"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(body["content_type"], "application/json");

    let rejected = server
        .post("/reservations")
        .json(&booking_body(5, "18:30", "19:30"))
        .await;
    assert_eq!(rejected.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        rejected.header("content-type"),
        HeaderValue::from_static("application/problem+json")
    );
    let problem: Value = rejected.json();
    assert_eq!(problem["type"], "/problems/reservation-conflict");
    assert_eq!(problem["errorKind"], "ConflictError");
    assert!(problem["detail"].as_str().unwrap().contains("18:00-19:00"));
    assert_eq!(problem["message"], problem["detail"]);
}

#[tokio::test]
async fn back_to_back_slots_are_both_accepted() {
    let (_db, server) = server(&[5]);

    for (start, end) in [("18:00", "19:00"), ("19:00", "20:00")] {
        server
            .post("/reservations")
            .json(&booking_body(5, start, end))
            .await
            .assert_status_ok();
    }
}

#[tokio::test]
async fn unknown_table_is_not_found() {
    let (_db, server) = server(&[5]);

    let response = server
        .post("/reservations")
        .json(&booking_body(99, "12:00", "13:00"))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/table-not-found");
    assert_eq!(problem["errorKind"], "NotFoundError");
    assert_eq!(problem["message"], "table 99 does not exist");
}

#[tokio::test]
async fn missing_field_is_a_validation_problem() {
    let (_db, server) = server(&[5]);
    let mut body = booking_body(5, "12:00", "13:00");
    body.as_object_mut().unwrap().remove("phoneNumber");

    let response = server.post("/reservations").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let problem: Value = response.json();
    assert_eq!(problem["errorKind"], "ValidationError");
    assert!(problem["detail"].as_str().unwrap().contains("phoneNumber"));
    assert!(problem["message"].as_str().unwrap().contains("phoneNumber"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_problem() {
    let (_db, server) = server(&[5]);

    let response = server.post("/reservations").text("{\"tableNumber\":").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/invalid-request");
}

#[tokio::test]
async fn listing_is_sorted_and_filterable() {
    let (_db, server) = server(&[1, 2]);
    for (table, start, end) in [(2, "09:00", "10:00"), (1, "20:00", "21:00"), (1, "08:00", "09:00")] {
        server
            .post("/reservations")
            .json(&booking_body(table, start, end))
            .await
            .assert_status_ok();
    }

    let all: Value = server.get("/reservations").await.json();
    let order: Vec<(u64, &str)> = all["reservations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["tableNumber"].as_u64().unwrap(),
                r["slotTimeStart"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(order, vec![(1, "08:00"), (1, "20:00"), (2, "09:00")]);

    let filtered: Value = server
        .get("/reservations")
        .add_query_param("tableNumber", "1")
        .add_query_param("date", "2024-06-01")
        .await
        .json();
    assert_eq!(filtered["reservations"].as_array().unwrap().len(), 2);

    let other_day: Value = server
        .get("/reservations")
        .add_query_param("date", "2024-06-02")
        .await
        .json();
    assert!(other_day["reservations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn bad_list_filter_is_a_bad_request() {
    let (_db, server) = server(&[1]);

    let response = server
        .get("/reservations")
        .add_query_param("tableNumber", "-3")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_idempotency_key_returns_same_id() {
    let (_db, server) = server(&[3]);
    let mut body = booking_body(3, "12:00", "13:00");
    body["idempotencyKey"] = json!("retry-abc");

    let first: Value = server.post("/reservations").json(&body).await.json();
    let second: Value = server.post("/reservations").json(&body).await.json();
    assert_eq!(first["reservationId"], second["reservationId"]);

    let listed: Value = server.get("/reservations").await.json();
    let reservations = listed["reservations"].as_array().unwrap();
    assert_eq!(reservations.len(), 1);
    assert!(reservations[0].get("idempotencyKey").is_none());
}

#[tokio::test]
async fn unknown_route_and_method_are_route_not_found() {
    let (_db, server) = server(&[1]);

    let response = server.get("/tables").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/route-not-found");
    assert_eq!(problem["detail"], "No handler for GET /tables");

    let response = server.delete("/reservations").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_propagated_to_problem_and_header() {
    let (_db, server) = server(&[1]);

    let response = server
        .post("/reservations")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("client-42"),
        )
        .json(&booking_body(77, "12:00", "13:00"))
        .await;

    assert_eq!(
        response.header("x-request-id"),
        HeaderValue::from_static("client-42")
    );
    let problem: Value = response.json();
    assert_eq!(problem["instance"], "client-42");
}

#[tokio::test]
async fn health_probes_report_catalog_state() {
    let (_db, server) = server(&[1, 2]);
    server.get("/health/live").await.assert_status_ok();

    let ready: Value = server.get("/health/ready").await.json();
    assert_eq!(ready["status"], "ok");
    assert_eq!(ready["tables_loaded"], 2);

    let (_empty_db, empty) = self::server(&[]);
    assert_eq!(
        empty.get("/health/ready").await.status_code(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn metrics_endpoint_is_served() {
    let (_db, server) = server(&[1]);
    let response = server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().starts_with('#') || response.text().contains("http_requests_total"));
}
