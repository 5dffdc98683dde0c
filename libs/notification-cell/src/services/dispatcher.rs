use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{NewNotification, Notification, NotificationError};

/// Writes in-app notifications to the `notifications` table. Push, email and
/// SMS delivery read from that table and are not handled here.
pub struct NotificationService {
    supabase: SupabaseClient,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn send(
        &self,
        notification: NewNotification,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        if notification.user_id.trim().is_empty() {
            return Err(NotificationError::ValidationError("recipient is required".to_string()));
        }
        if notification.title.trim().is_empty() {
            return Err(NotificationError::ValidationError("title is required".to_string()));
        }

        debug!("Sending {} notification to user {}", notification.category, notification.user_id);

        let body = json!({
            "user_id": notification.user_id,
            "title": notification.title,
            "message": notification.message,
            "category": notification.category,
            "related_object_id": notification.related_object_id,
            "is_read": false,
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/notifications",
            Some(auth_token),
            Some(body),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next()
            .ok_or_else(|| NotificationError::DatabaseError("Failed to create notification".to_string()))?;

        let created: Notification = serde_json::from_value(row)
            .map_err(|e| NotificationError::DatabaseError(format!("Failed to parse notification: {}", e)))?;

        info!("Notification {} stored for user {}", created.id, created.user_id);
        Ok(created)
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: i32,
        auth_token: &str,
    ) -> Result<Vec<Notification>, NotificationError> {
        debug!("Listing notifications for user {} (unread_only: {})", user_id, unread_only);

        let mut path = format!(
            "/rest/v1/notifications?user_id=eq.{}&order=created_at.desc&limit={}",
            user_id,
            limit.clamp(1, 200)
        );
        if unread_only {
            path.push_str("&is_read=eq.false");
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| NotificationError::DatabaseError(format!("Failed to parse notification: {}", e)))
            })
            .collect()
    }

    /// Marks a notification read; only its recipient may do so.
    pub async fn mark_read(
        &self,
        notification_id: i64,
        user_id: &str,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        let path = format!("/rest/v1/notifications?id=eq.{}&limit=1", notification_id);
        let existing: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let current: Notification = match existing.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map_err(|e| NotificationError::DatabaseError(format!("Failed to parse notification: {}", e)))?,
            None => return Err(NotificationError::NotFound),
        };

        if current.user_id != user_id {
            return Err(NotificationError::NotOwner);
        }

        if current.is_read {
            return Ok(current);
        }

        let update_path = format!("/rest/v1/notifications?id=eq.{}", notification_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &update_path,
            Some(auth_token),
            Some(json!({ "is_read": true })),
            Some(SupabaseClient::return_representation()),
        ).await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next().ok_or(NotificationError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| NotificationError::DatabaseError(format!("Failed to parse notification: {}", e)))
    }
}
