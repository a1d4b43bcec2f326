use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_database::{ChangeFeed, Table};
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(config: &AppConfig, feed: ChangeFeed) -> Router {
    appointment_routes(Arc::new(config.clone()), feed)
}

async fn mount_profile(mock_server: &MockServer, user: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::profile_response(&user.id, &user.email, &user.role)
        ])))
        .mount(mock_server)
        .await;
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn next_open_day() -> NaiveDate {
    let mut day = Utc::now().date_naive() + Duration::days(1);
    while day.weekday() == Weekday::Sun {
        day += Duration::days(1);
    }
    day
}

fn authorized(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn mount_doctor(mock_server: &MockServer, doctor_id: &str) {
    mount_doctor_with_status(mock_server, doctor_id, "available").await;
}

async fn mount_doctor_with_status(mock_server: &MockServer, doctor_id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(doctor_id, &Uuid::new_v4().to_string(), "Dr. Sarah Johnson", status)
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn booking_writes_appointment_then_queue_entry() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;
    let doctor_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4().to_string();
    let queue_item_id = Uuid::new_v4().to_string();
    let day = next_open_day();

    mount_doctor(&mock_server, &doctor_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({
            "patient_id": user.id,
            "doctor_id": doctor_id,
            "time_slot": "10:30 AM",
            "status": "booked"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(&appointment_id, &user.id, &doctor_id, &day.to_string(), "10:30 AM", "booked")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/queue_items"))
        .and(body_json(json!({
            "appointment_id": appointment_id,
            "status": "waiting",
            "estimated_time": 20
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": queue_item_id }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let feed = ChangeFeed::new();
    let mut queue_changes = feed.subscribe(Table::QueueItems).await;
    let app = create_test_app(&config, feed);

    let response = app
        .oneshot(authorized("POST", "/", &token, Some(json!({
            "doctor_id": doctor_id,
            "date": day,
            "time_slot": "10:30 AM",
            "symptoms": "Headache"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["queue_item_id"], queue_item_id);
    assert_eq!(body["appointment"]["status"], "booked");
    assert_eq!(body["appointment"]["doctor_name"], "Dr. Sarah Johnson");
    assert_eq!(
        body["message"],
        format!(
            "Your appointment with Dr. Sarah Johnson is confirmed for {} at 10:30 AM",
            day.format("%B %-d, %Y")
        )
    );
    assert_eq!(queue_changes.recv().await.unwrap().table, Table::QueueItems);
}

#[tokio::test]
async fn failed_queue_entry_cancels_the_appointment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;
    let doctor_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4().to_string();
    let day = next_open_day();

    mount_doctor(&mock_server, &doctor_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_response(&appointment_id, &user.id, &doctor_id, &day.to_string(), "9:00 AM", "booked")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/queue_items"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("insert failed", "XX000"),
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(body_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": appointment_id, "status": "cancelled" }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config, ChangeFeed::new());
    let response = app
        .oneshot(authorized("POST", "/", &token, Some(json!({
            "doctor_id": doctor_id,
            "date": day,
            "time_slot": "9:00 AM"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn booking_without_slot_is_rejected_before_any_write() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config, ChangeFeed::new());
    let response = app
        .oneshot(authorized("POST", "/", &token, Some(json!({
            "doctor_id": Uuid::new_v4(),
            "date": next_open_day()
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Please select date and time slot");
}

#[tokio::test]
async fn booking_an_away_doctor_is_refused_without_writes() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let doctor_id = Uuid::new_v4().to_string();
    mount_profile(&mock_server, &user).await;
    mount_doctor_with_status(&mock_server, &doctor_id, "away").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config, ChangeFeed::new());
    let response = app
        .oneshot(authorized("POST", "/", &token, Some(json!({
            "doctor_id": doctor_id,
            "date": next_open_day(),
            "time_slot": "10:00 AM"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(read_json(response).await["error"], "Dr. Sarah Johnson is not available for booking right now");
}

#[tokio::test]
async fn booking_on_a_past_date_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;

    let app = create_test_app(&config, ChangeFeed::new());
    let response = app
        .oneshot(authorized("POST", "/", &token, Some(json!({
            "doctor_id": Uuid::new_v4(),
            "date": Utc::now().date_naive() - Duration::days(2),
            "time_slot": "9:00 AM"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn doctors_cannot_book() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;

    let app = create_test_app(&config, ChangeFeed::new());
    let response = app
        .oneshot(authorized("POST", "/", &token, Some(json!({
            "doctor_id": Uuid::new_v4(),
            "date": next_open_day(),
            "time_slot": "9:00 AM"
        }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn time_slots_report_bookability() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;

    let mut sunday = Utc::now().date_naive() + Duration::days(1);
    while sunday.weekday() != Weekday::Sun {
        sunday += Duration::days(1);
    }

    let app = create_test_app(&config, ChangeFeed::new());
    let response = app
        .oneshot(authorized("GET", &format!("/time-slots?date={}", sunday), &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["time_slots"].as_array().unwrap().len(), 12);
    assert_eq!(body["time_slots"][6], "2:00 PM");
    assert_eq!(body["bookable"], false);
}

#[tokio::test]
async fn patient_cannot_cancel_someone_elses_appointment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;
    let appointment_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id,
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "2026-03-02",
                "9:00 AM",
                "booked",
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config, ChangeFeed::new());
    let response = app
        .oneshot(authorized("POST", &format!("/{}/cancel", appointment_id), &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn patient_cancels_own_booked_appointment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user).await;
    let appointment_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(
                &appointment_id,
                &user.id,
                &Uuid::new_v4().to_string(),
                "2026-03-02",
                "9:00 AM",
                "booked",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(body_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": appointment_id, "status": "cancelled" }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let feed = ChangeFeed::new();
    let mut appointment_changes = feed.subscribe(Table::Appointments).await;
    let app = create_test_app(&config, feed);
    let response = app
        .oneshot(authorized("POST", &format!("/{}/cancel", appointment_id), &token, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["appointment"]["status"], "cancelled");
    assert_eq!(body["appointment"]["patient_name"], "John Doe");
    assert_eq!(appointment_changes.recv().await.unwrap().table, Table::Appointments);
}
