use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{NotificationError, NotificationListQuery};
use crate::services::NotificationService;

fn to_app_error(error: NotificationError) -> AppError {
    match error {
        NotificationError::NotFound => AppError::NotFound(error.to_string()),
        NotificationError::NotOwner => {
            AppError::rejected(StatusCode::FORBIDDEN, "MSG_UNAUTHORIZED", error.to_string())
        }
        NotificationError::ValidationError(msg) => AppError::BadRequest(msg),
        NotificationError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Value>, AppError> {
    let notifications = NotificationService::new(&state)
        .list_for_user(
            &user.id,
            query.unread_only.unwrap_or(false),
            query.limit.unwrap_or(50),
            auth.token(),
        )
        .await
        .map_err(to_app_error)?;

    let unread = notifications.iter().filter(|n| !n.is_read).count();

    Ok(Json(json!({
        "notifications": notifications,
        "total": notifications.len(),
        "unread": unread
    })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<AppConfig>>,
    Path(notification_id): Path<i64>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let notification = NotificationService::new(&state)
        .mark_read(notification_id, &user.id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "notification": notification
    })))
}
