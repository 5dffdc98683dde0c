use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::{NewNotification, NotificationCategory, NotificationError};
use notification_cell::{notification_routes, NotificationService};
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(config: AppConfig) -> Router {
    notification_routes(Arc::new(config))
}

async fn call(app: Router, http_method: &str, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(http_method)
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn send_inserts_unread_notification() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({
            "user_id": "user-patient-10",
            "category": "appointment",
            "related_object_id": 1,
            "is_read": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::notification_response(1, "user-patient-10", false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let created = NotificationService::new(&config)
        .send(
            NewNotification {
                user_id: "user-patient-10".to_string(),
                title: "Appointment booked".to_string(),
                message: "Your appointment has been booked".to_string(),
                category: NotificationCategory::Appointment,
                related_object_id: Some(1),
            },
            "token",
        )
        .await
        .unwrap();

    assert_eq!(created.id, 1);
    assert!(!created.is_read);
}

#[tokio::test]
async fn send_requires_recipient() {
    let config = TestConfig::default().to_app_config();
    let result = NotificationService::new(&config)
        .send(
            NewNotification {
                user_id: " ".to_string(),
                title: "Appointment booked".to_string(),
                message: String::new(),
                category: NotificationCategory::Appointment,
                related_object_id: None,
            },
            "token",
        )
        .await;

    assert_matches!(result, Err(NotificationError::ValidationError(_)));
}

#[tokio::test]
async fn send_surfaces_storage_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let result = NotificationService::new(&config)
        .send(
            NewNotification {
                user_id: "user-patient-10".to_string(),
                title: "Appointment cancelled".to_string(),
                message: String::new(),
                category: NotificationCategory::Appointment,
                related_object_id: Some(6),
            },
            "token",
        )
        .await;

    assert_matches!(result, Err(NotificationError::DatabaseError(_)));
}

#[tokio::test]
async fn list_returns_callers_notifications() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("user_id", "eq.user-patient-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(2, "user-patient-10", false),
            MockSupabaseResponses::notification_response(1, "user-patient-10", true)
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::patient(10), &config.supabase_jwt_secret, Some(1));

    let (status, body) = call(create_test_app(config), "GET", "/", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["unread"], 1);
}

#[tokio::test]
async fn mark_read_rejects_other_users_notification() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(3, "user-patient-16", false)
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::patient(10), &config.supabase_jwt_secret, Some(1));

    let (status, body) = call(create_test_app(config), "POST", "/3/read", &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "MSG_UNAUTHORIZED");
}

#[tokio::test]
async fn mark_read_updates_own_notification() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("id", "eq.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(4, "user-patient-10", false)
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("id", "eq.4"))
        .and(body_partial_json(json!({ "is_read": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(4, "user-patient-10", true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::patient(10), &config.supabase_jwt_secret, Some(1));

    let (status, body) = call(create_test_app(config), "POST", "/4/read", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notification"]["is_read"], true);
}
