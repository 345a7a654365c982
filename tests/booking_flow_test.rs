use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use flight_booking::core::timezone::CivilTimestamp;
use flight_booking::{router, BookingService, HttpPassportClient, PassengerRegistry, TomlConfig};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const MISMATCH: &str = "Firstname or Lastname is mismatch.";

/// 用專案內的 booking.toml 航班表，護照登記處指向 mock server
fn test_app(passport_api: &str) -> Router {
    let config = TomlConfig::from_file("booking.toml")
        .unwrap()
        .with_overrides(None, Some(passport_api.to_string()));

    let schedule = Arc::new(config.schedule().unwrap());
    let registry = Arc::new(PassengerRegistry::new(&schedule));
    let passports = Arc::new(HttpPassportClient::new(&config).unwrap());
    router(Arc::new(BookingService::new(schedule, registry, passports)))
}

/// passport_match / passport_update 兩組 stub
fn stub_passports(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/passports/BC1500");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"first_name": "Shauna", "last_name": "Davila"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/passports/UPDATE");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"first_name": "Joey", "last_name": "Tribbiani"}));
    });
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn shauna() -> Value {
    json!({"passport_id": "BC1500", "first_name": "Shauna", "last_name": "Davila"})
}

fn find_flight<'a>(flights: &'a Value, id: &str) -> &'a Value {
    flights["flights"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["id"] == id)
        .unwrap_or_else(|| panic!("flight {id} missing from listing"))
}

#[tokio::test]
async fn test_create_booking_with_valid_passenger() {
    let server = MockServer::start();
    stub_passports(&server);
    let app = test_app(&server.base_url());

    let (status, passenger) = send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(passenger["flight_id"], "AAA01");
    assert_eq!(passenger["passport_id"], "BC1500");
    assert_eq!(passenger["first_name"], "Shauna");
    assert_eq!(passenger["last_name"], "Davila");
    assert_eq!(passenger["customer_id"], 1);
}

#[tokio::test]
async fn test_create_booking_with_mismatched_names() {
    let server = MockServer::start();
    stub_passports(&server);
    let app = test_app(&server.base_url());

    let (status, error) = send(
        &app,
        "POST",
        "/flights/AAA01/passengers",
        Some(json!({"passport_id": "BC1500", "first_name": "Gems", "last_name": "Doe"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error, json!({"detail": MISMATCH}));

    let (_, listing) = send(&app, "GET", "/flights/AAA01/passengers", None).await;
    assert_eq!(listing, json!({"passengers": []}));
}

#[tokio::test]
async fn test_unknown_passport_is_rejected_like_a_mismatch() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/passports/XX0000");
        then.status(404);
    });
    let app = test_app(&server.base_url());

    let (status, error) = send(
        &app,
        "POST",
        "/flights/AAA01/passengers",
        Some(json!({"passport_id": "XX0000", "first_name": "Shauna", "last_name": "Davila"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["detail"], MISMATCH);
}

#[tokio::test]
async fn test_retrieve_flight_details_different_timezone() {
    let server = MockServer::start();
    let app = test_app(&server.base_url());

    let (status, flights) = send(&app, "GET", "/flights", None).await;
    assert_eq!(status, StatusCode::OK);

    let aaa02 = find_flight(&flights, "AAA02");
    assert_eq!(aaa02["departure_time"], "2024-12-01T10:00:00Z");
    assert_eq!(aaa02["arrival_time"], "2024-12-01T21:00:00+07:00");
    assert_eq!(aaa02["departure_timezone"], "Europe/London");
    assert_eq!(aaa02["arrival_timezone"], "Asia/Bangkok");

    // Z 與 +00:00 代表同一時刻
    let departure = CivilTimestamp::parse(aaa02["departure_time"].as_str().unwrap()).unwrap();
    assert_eq!(
        departure,
        CivilTimestamp::parse("2024-12-01T10:00:00+00:00").unwrap()
    );
}

#[tokio::test]
async fn test_retrieve_flight_details_same_timezone() {
    let server = MockServer::start();
    let app = test_app(&server.base_url());

    let (status, flights) = send(&app, "GET", "/flights", None).await;
    assert_eq!(status, StatusCode::OK);

    let aaa03 = find_flight(&flights, "AAA03");
    assert_eq!(aaa03["departure_time"], "2024-12-01T07:00:00+07:00");
    assert_eq!(aaa03["arrival_time"], "2024-12-01T09:00:00+07:00");
}

#[tokio::test]
async fn test_wall_clock_schedule_entry_uses_summer_offsets() {
    let server = MockServer::start();
    let app = test_app(&server.base_url());

    let (_, flights) = send(&app, "GET", "/flights", None).await;
    let aaa04 = find_flight(&flights, "AAA04");
    assert_eq!(aaa04["departure_time"], "2025-07-01T09:00:00+01:00");
    assert_eq!(aaa04["arrival_time"], "2025-07-01T12:00:00-04:00");
}

#[tokio::test]
async fn test_update_customer_information() {
    let server = MockServer::start();
    stub_passports(&server);
    let app = test_app(&server.base_url());
    send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;

    let (status, data) = send(
        &app,
        "PUT",
        "/flights/AAA01/passengers/1",
        Some(json!({"passport_id": "UPDATE", "first_name": "Joey", "last_name": "Tribbiani"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["flight_id"], "AAA01");
    assert_eq!(data["customer_id"], 1);
    assert_eq!(data["passport_id"], "UPDATE");
    assert_eq!(data["first_name"], "Joey");
    assert_eq!(data["last_name"], "Tribbiani");
}

#[tokio::test]
async fn test_update_customer_name_mismatch_keeps_previous_record() {
    let server = MockServer::start();
    stub_passports(&server);
    let app = test_app(&server.base_url());
    let (_, created) = send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;

    let (status, error) = send(
        &app,
        "PUT",
        "/flights/AAA01/passengers/1",
        Some(json!({"passport_id": "UPDATE", "first_name": "John", "last_name": "Doe"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["detail"], MISMATCH);

    let (_, listing) = send(&app, "GET", "/flights/AAA01/passengers", None).await;
    assert_eq!(listing["passengers"], json!([created]));
}

#[tokio::test]
async fn test_update_of_unknown_customer_is_404() {
    let server = MockServer::start();
    stub_passports(&server);
    let app = test_app(&server.base_url());

    let (status, error) = send(
        &app,
        "PUT",
        "/flights/AAA01/passengers/77",
        Some(json!({"passport_id": "UPDATE", "first_name": "Joey", "last_name": "Tribbiani"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(error["detail"].is_string());
}

#[tokio::test]
async fn test_delete_passenger() {
    let server = MockServer::start();
    stub_passports(&server);
    let app = test_app(&server.base_url());
    let (_, created) = send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;
    let customer_id = created["customer_id"].as_u64().unwrap();

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/flights/AAA01/passengers/{customer_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);

    // 再刪一次與刪除不存在的乘客都回 200
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/flights/AAA01/passengers/{customer_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], false);

    let (status, _) = send(&app, "DELETE", "/flights/AAA01/passengers/9992", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, listing) = send(&app, "GET", "/flights/AAA01/passengers", None).await;
    assert_eq!(status, StatusCode::OK);
    let passengers = listing["passengers"].as_array().unwrap();
    assert!(passengers
        .iter()
        .all(|p| p["customer_id"] != customer_id && p["customer_id"] != 9992));
}

#[tokio::test]
async fn test_deleted_customer_id_is_not_reused() {
    let server = MockServer::start();
    stub_passports(&server);
    let app = test_app(&server.base_url());

    send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;
    send(&app, "DELETE", "/flights/AAA01/passengers/1", None).await;
    let (_, second) = send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;

    assert_eq!(second["customer_id"], 2);
}

#[tokio::test]
async fn test_registry_error_is_not_reported_as_mismatch() {
    let server = MockServer::start();
    let registry_mock = server.mock(|when, then| {
        when.method(GET).path("/passports/BC1500");
        then.status(500);
    });
    let app = test_app(&server.base_url());

    let (status, error) = send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;

    registry_mock.assert();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_ne!(error["detail"], MISMATCH);

    let (_, listing) = send(&app, "GET", "/flights/AAA01/passengers", None).await;
    assert_eq!(listing["passengers"], json!([]));
}

#[tokio::test]
async fn test_unreachable_registry_is_503() {
    let app = test_app("http://127.0.0.1:1");

    let (status, _) = send(&app, "POST", "/flights/AAA01/passengers", Some(shauna())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_booking_on_unknown_flight_is_404_without_lookup() {
    let server = MockServer::start();
    let registry_mock = server.mock(|when, then| {
        when.method(GET).path("/passports/BC1500");
        then.status(200)
            .json_body(json!({"first_name": "Shauna", "last_name": "Davila"}));
    });
    let app = test_app(&server.base_url());

    let (status, _) = send(&app, "POST", "/flights/ZZZ99/passengers", Some(shauna())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    registry_mock.assert_hits(0);
}
