use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::router::patient_routes;
use patient_cell::models::PatientSearchQuery;
use patient_cell::services::PatientService;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(config: AppConfig) -> Router {
    patient_routes(Arc::new(config))
}

async fn get_json(app: Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn mount_patient(mock_server: &MockServer, patient_id: i64) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(patient_id, "Nguyen Van A")
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn service_returns_none_for_unknown_patient() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let service = PatientService::new(&config);

    let patient = service.get_patient(404, "token").await.unwrap();
    assert!(patient.is_none());
}

#[tokio::test]
async fn patient_can_read_own_record() {
    let mock_server = MockServer::start().await;
    mount_patient(&mock_server, 16).await;

    let test_config = TestConfig::default();
    let config = test_config.for_server(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::patient(16), &config.supabase_jwt_secret, Some(1));

    let (status, body) = get_json(create_test_app(config), "/16", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 16);
    assert_eq!(body["fullname"], "Nguyen Van A");
}

#[tokio::test]
async fn patient_cannot_read_another_patient() {
    let mock_server = MockServer::start().await;
    mount_patient(&mock_server, 10).await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::patient(16), &config.supabase_jwt_secret, Some(1));

    let (status, body) = get_json(create_test_app(config), "/10", &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "MSG_UNAUTHORIZED");
}

#[tokio::test]
async fn unknown_patient_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::receptionist(1), &config.supabase_jwt_secret, Some(1));

    let (status, _) = get_json(create_test_app(config), "/99", &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn receptionist_searches_by_name() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("fullname", "ilike.*Nguyen*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(10, "Nguyen Van A"),
            MockSupabaseResponses::patient_response(16, "Nguyen Thi B")
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::receptionist(1), &config.supabase_jwt_secret, Some(1));

    let (status, body) = get_json(create_test_app(config), "/search?name=Nguyen", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn patient_cannot_search() {
    let config = TestConfig::default().to_app_config();
    let token = JwtTestUtils::create_test_token(&TestUser::patient(10), &config.supabase_jwt_secret, Some(1));

    let (status, _) = get_json(create_test_app(config), "/search?name=Nguyen", &token).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn search_text_cannot_add_filters() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("fullname", "ilike.*x&id=eq.1*"))
        .and(query_param("phone", "like.*09(1),2#*"))
        .and(query_param_is_missing("id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::default().for_server(&mock_server.uri());
    let service = PatientService::new(&config);

    let query = PatientSearchQuery {
        name: Some("x&id=eq.1".to_string()),
        phone: Some("09(1),2#".to_string()),
        limit: None,
        offset: None,
    };
    let patients = service.search_patients(query, "token").await.unwrap();
    assert!(patients.is_empty());

    let requests = mock_server.received_requests().await.unwrap();
    let raw_query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(raw_query.contains("fullname=ilike.*x%26id%3Deq.1*"), "{}", raw_query);
    assert!(!raw_query.contains("&id="), "{}", raw_query);
}
