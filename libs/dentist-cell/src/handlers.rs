use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::caller_from_user;

use crate::models::{DentistError, DentistListQuery};
use crate::services::DentistService;

fn to_app_error(error: DentistError) -> AppError {
    match error {
        DentistError::NotFound => AppError::NotFound(error.to_string()),
        DentistError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_dentists(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DentistListQuery>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_from_user(&user)?;

    // Patients only ever see dentists they can book
    let include_inactive = caller.role.is_staff() && query.include_inactive.unwrap_or(false);

    let dentists = DentistService::new(&state)
        .list_dentists(include_inactive, auth.token())
        .await
        .map_err(|e| to_app_error(DentistError::DatabaseError(e.to_string())))?;

    Ok(Json(json!({
        "dentists": dentists,
        "total": dentists.len()
    })))
}

#[axum::debug_handler]
pub async fn get_dentist(
    State(state): State<Arc<AppConfig>>,
    Path(dentist_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    caller_from_user(&user)?;

    let dentist = DentistService::new(&state)
        .get_dentist(dentist_id, auth.token())
        .await
        .map_err(|e| to_app_error(DentistError::DatabaseError(e.to_string())))?
        .ok_or_else(|| to_app_error(DentistError::NotFound))?;

    Ok(Json(json!(dentist)))
}
