use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header, query_param};

use auth_cell::router::auth_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils, MockSupabaseResponses};

async fn mount_profile(mock_server: &MockServer, user_id: &str, name: &str, role: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::profile_response(user_id, name, role)
        ])))
        .mount(mock_server)
        .await;
}

async fn create_test_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn login_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mount_sign_in(mock_server: &MockServer, user: &TestUser, access_token: &str, profile_role: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSupabaseResponses::token_response(user, access_token)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .and(header("Authorization", format!("Bearer {}", access_token)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::profile_response(&user.id, "John Doe", profile_role)
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_validate_token_endpoint() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::compounder("desk@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = read_json(response).await;
    assert_eq!(json_response["valid"], true);
    assert_eq!(json_response["user_id"], user.id);
    assert_eq!(json_response["email"], user.email);
    assert_eq!(json_response["role"], "authenticated");
}

#[tokio::test]
async fn test_validate_token_endpoint_unauthorized() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_token_reports_expired_as_invalid() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::default();
    let token = JwtTestUtils::create_expired_token(&user, &config.supabase_jwt_secret);

    let request = Request::builder()
        .method("POST")
        .uri("/verify")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["valid"], false);
}

#[tokio::test]
async fn test_login_with_matching_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    mount_sign_in(&mock_server, &user, "access-token", "patient").await;

    let app = create_test_app(config).await;
    let response = app
        .oneshot(login_request(json!({
            "email": "john@example.com",
            "password": "password123",
            "role": "patient"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json_response = read_json(response).await;
    assert_eq!(json_response["success"], true);
    assert_eq!(json_response["session"]["user_id"], user.id);
    assert_eq!(json_response["session"]["name"], "John Doe");
    assert_eq!(json_response["session"]["role"], "patient");
    assert_eq!(json_response["session"]["access_token"], "access-token");
}

#[tokio::test]
async fn test_login_with_mismatched_role_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    mount_sign_in(&mock_server, &user, "access-token", "patient").await;

    let app = create_test_app(config).await;
    let response = app
        .oneshot(login_request(json!({
            "email": "john@example.com",
            "password": "password123",
            "role": "doctor"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            MockSupabaseResponses::error_response("Invalid login credentials", "invalid_grant"),
        ))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;
    let response = app
        .oneshot(login_request(json!({
            "email": "john@example.com",
            "password": "wrong",
            "role": "patient"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_with_empty_field_never_calls_auth() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;
    let response = app
        .oneshot(login_request(json!({
            "email": "john@example.com",
            "password": "",
            "role": "patient"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Please fill in all fields");
}

#[tokio::test]
async fn test_login_with_unknown_role() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config).await;

    let response = app
        .oneshot(login_request(json!({
            "email": "john@example.com",
            "password": "password123",
            "role": "admin"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_endpoint_returns_profile_role() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    mount_profile(&mock_server, &user.id, "Dr. Sarah Johnson", "doctor").await;

    let app = create_test_app(config).await;
    let request = Request::builder()
        .method("GET")
        .uri("/session")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = read_json(response).await;
    assert_eq!(json_response["name"], "Dr. Sarah Johnson");
    assert_eq!(json_response["role"], "doctor");
}

#[tokio::test]
async fn test_logout_calls_gotrue() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::patient("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user.id, "John Doe", "patient").await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", format!("Bearer {}", token)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;
    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["success"], true);
}

#[tokio::test]
async fn test_session_role_ignores_token_metadata() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    // Metadata claims compounder; the profile row says patient.
    let user = TestUser::compounder("john@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    mount_profile(&mock_server, &user.id, "John Doe", "patient").await;

    let app = create_test_app(config).await;
    let request = Request::builder()
        .method("GET")
        .uri("/session")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["role"], "patient");
}

#[tokio::test]
async fn test_session_without_profile_is_forbidden() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::compounder("desk@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(config).await;
    let request = Request::builder()
        .method("GET")
        .uri("/session")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
