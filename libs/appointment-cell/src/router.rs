// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/follow-up", post(handlers::create_follow_up))
        .route("/slots/check", get(handlers::check_slot))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment).put(handlers::edit_appointment),
        )
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/{appointment_id}/attend", post(handlers::attend_appointment))

        // Listings
        .route("/patients/{patient_id}", get(handlers::list_patient_appointments))
        .route("/dentists/{dentist_id}", get(handlers::list_dentist_appointments))
        .route("/dentists/{dentist_id}/free-slots", get(handlers::get_free_slots))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
