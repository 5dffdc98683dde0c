use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Extension, Router,
};
use tower::ServiceExt;

use shared_models::auth::User;
use shared_utils::extractor::{auth_middleware, caller_from_user};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn protected_app() -> Router {
    let config = TestConfig::default().to_arc();

    Router::new()
        .route(
            "/whoami",
            get(|Extension(user): Extension<User>| async move {
                match caller_from_user(&user) {
                    Ok(caller) => format!("{}:{}", caller.role, caller.role_id),
                    Err(_) => "unknown".to_string(),
                }
            }),
        )
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let response = protected_app()
        .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_header_is_unauthorized() {
    let response = protected_app()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("Authorization", "Basic abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_handler_with_caller() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_test_token(&TestUser::receptionist(3), &config.jwt_secret, Some(1));

    let response = protected_app()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Receptionist:3");
}
