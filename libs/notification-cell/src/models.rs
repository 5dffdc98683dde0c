use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Appointment,
    Treatment,
    Invoice,
    Prescription,
    Task,
    System,
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationCategory::Appointment => write!(f, "appointment"),
            NotificationCategory::Treatment => write!(f, "treatment"),
            NotificationCategory::Invoice => write!(f, "invoice"),
            NotificationCategory::Prescription => write!(f, "prescription"),
            NotificationCategory::Task => write!(f, "task"),
            NotificationCategory::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_object_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload of a `send` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewNotification {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_object_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NotificationListQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Notification belongs to another user")]
    NotOwner,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
