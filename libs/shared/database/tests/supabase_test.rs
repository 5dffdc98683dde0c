use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "secret".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn request_sends_api_key_and_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/dentists"))
        .and(query_param("id", "eq.5"))
        .and(header("apikey", "test-anon-key"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 5 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let rows: Vec<Value> = client
        .request(reqwest::Method::GET, "/rest/v1/dentists?id=eq.5", Some("user-token"), None)
        .await
        .unwrap();

    assert_eq!(rows, vec![json!({ "id": 5 })]);
}

#[tokio::test]
async fn request_with_headers_forwards_prefer_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let rows: Vec<Value> = client
        .request_with_headers(
            reqwest::Method::POST,
            "/rest/v1/notifications",
            Some("user-token"),
            Some(json!({ "title": "hello" })),
            Some(SupabaseClient::return_representation()),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn non_success_status_becomes_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let result: anyhow::Result<Vec<Value>> = client
        .request(reqwest::Method::GET, "/rest/v1/appointments", None, None)
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("500"), "unexpected error: {}", err);
    assert!(err.contains("boom"));
}

#[test]
fn base_url_drops_trailing_slash() {
    let config = AppConfig {
        supabase_url: "https://project.supabase.co/".to_string(),
        ..AppConfig::default()
    };

    assert_eq!(SupabaseClient::new(&config).get_base_url(), "https://project.supabase.co");
}
