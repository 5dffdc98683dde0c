use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Extension, Json, Router,
};

use appointment_cell::router::appointment_routes;
use dentist_cell::router::dentist_routes;
use notification_cell::router::notification_routes;
use patient_cell::router::patient_routes;
use shared_config::AppConfig;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::{auth_middleware, caller_from_user};

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Dental clinic API is running!" }))
        .nest("/auth", session_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/dentists", dentist_routes(state.clone()))
        .nest("/notifications", notification_routes(state))
}

fn session_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/session", get(session))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Identity the API resolved from the bearer token.
async fn session(Extension(user): Extension<User>) -> Result<Json<TokenResponse>, AppError> {
    let caller = caller_from_user(&user)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: Some(caller.role.to_string()),
        role_id: Some(caller.role_id),
    }))
}
