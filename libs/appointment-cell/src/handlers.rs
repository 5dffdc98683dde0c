// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::{AppConfig, Locale};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::caller_from_user;

use crate::models::{
    AppointmentError, AppointmentOutcome, CreateAppointmentRequest, DateQuery,
    EditAppointmentRequest, FollowUpAppointmentRequest, SlotCheckQuery,
};
use crate::services::AppointmentWorkflow;

/// Render a workflow error as a coded, localized HTTP rejection.
pub fn to_app_error(error: AppointmentError, locale: Locale) -> AppError {
    let status = match &error {
        AppointmentError::Unauthorized(_) => StatusCode::FORBIDDEN,
        AppointmentError::NotFound(_) => StatusCode::NOT_FOUND,
        AppointmentError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppointmentError::InvalidState(_) => StatusCode::CONFLICT,
        AppointmentError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let code = error.message_code();

    AppError::rejected(status, code.code(), code.text(locale))
}

fn outcome_response(outcome: AppointmentOutcome, locale: Locale) -> Json<Value> {
    Json(json!({
        "success": true,
        "code": outcome.message.code(),
        "message": outcome.message.text(locale),
        "appointment": outcome.appointment
    }))
}

// ==============================================================================
// COMMAND HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let outcome = workflow.create(&caller, request)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(outcome_response(outcome, config.locale))
}

#[axum::debug_handler]
pub async fn create_follow_up(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<FollowUpAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let outcome = workflow.create_follow_up(&caller, request)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(outcome_response(outcome, config.locale))
}

#[axum::debug_handler]
pub async fn edit_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<EditAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let outcome = workflow.edit(&caller, appointment_id, request)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(outcome_response(outcome, config.locale))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let outcome = workflow.cancel(&caller, appointment_id)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(outcome_response(outcome, config.locale))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let outcome = workflow.confirm(&caller, appointment_id)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(outcome_response(outcome, config.locale))
}

#[axum::debug_handler]
pub async fn attend_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let outcome = workflow.mark_attended(&caller, appointment_id)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(outcome_response(outcome, config.locale))
}

// ==============================================================================
// QUERY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let appointment = workflow.get(&caller, appointment_id)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let appointments = workflow.list_for_patient(&caller, patient_id)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_dentist_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(dentist_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let appointments = workflow.list_for_dentist_on(&caller, dentist_id, &query.date)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_free_slots(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(dentist_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let slots = workflow.free_slots(&caller, dentist_id, &query.date)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(Json(json!(slots)))
}

#[axum::debug_handler]
pub async fn check_slot(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    let workflow = AppointmentWorkflow::for_request(&config, auth.token());

    let availability = workflow.check_slot(&caller, query)
        .await
        .map_err(|e| to_app_error(e, config.locale))?;

    Ok(Json(json!(availability)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageCode;

    #[test]
    fn workflow_errors_map_to_statuses() {
        let cases = [
            (AppointmentError::Unauthorized(MessageCode::NotAllowed), StatusCode::FORBIDDEN),
            (AppointmentError::NotFound(MessageCode::AppointmentNotFound), StatusCode::NOT_FOUND),
            (AppointmentError::ValidationError(MessageCode::SlotUnavailable), StatusCode::BAD_REQUEST),
            (AppointmentError::InvalidState(MessageCode::InvalidStatus), StatusCode::CONFLICT),
            (AppointmentError::Unexpected("db down".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(to_app_error(error, Locale::En).status(), status);
        }
    }

    #[test]
    fn unexpected_errors_hide_their_cause() {
        let error = to_app_error(AppointmentError::Unexpected("password=hunter2".to_string()), Locale::En);
        assert!(!error.to_string().contains("hunter2"));
        assert!(error.to_string().starts_with("MSG_UNEXPECTED"));
    }
}
