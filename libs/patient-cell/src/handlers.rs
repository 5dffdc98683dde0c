use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{Caller, User};
use shared_models::error::AppError;
use shared_utils::extractor::caller_from_user;

use crate::models::{PatientError, PatientSearchQuery};
use crate::services::PatientService;

fn ensure_can_view(caller: &Caller, patient_id: i64) -> Result<(), PatientError> {
    if caller.role.is_staff() || caller.is_patient(patient_id) {
        Ok(())
    } else {
        Err(PatientError::Unauthorized)
    }
}

fn to_app_error(error: PatientError) -> AppError {
    match error {
        PatientError::NotFound => AppError::NotFound(error.to_string()),
        PatientError::Unauthorized => {
            AppError::rejected(axum::http::StatusCode::FORBIDDEN, "MSG_UNAUTHORIZED", error.to_string())
        }
        PatientError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    ensure_can_view(&caller, patient_id).map_err(to_app_error)?;

    let service = PatientService::new(&config);

    let patient = service.get_patient(patient_id, auth.token())
        .await
        .map_err(|e| to_app_error(PatientError::DatabaseError(e.to_string())))?
        .ok_or_else(|| to_app_error(PatientError::NotFound))?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;
    if !caller.role.is_staff() {
        return Err(to_app_error(PatientError::Unauthorized));
    }

    let service = PatientService::new(&config);

    let patients = service.search_patients(query, auth.token())
        .await
        .map_err(|e| to_app_error(PatientError::DatabaseError(e.to_string())))?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}
