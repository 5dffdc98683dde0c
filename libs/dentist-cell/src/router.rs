use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn dentist_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_dentists))
        .route("/{dentist_id}", get(handlers::get_dentist))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
