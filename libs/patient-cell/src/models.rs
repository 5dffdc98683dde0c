use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Patient role record. The account itself lives in the identity subsystem;
/// `user_id` points back to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub user_id: String,
    pub fullname: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatientSearchQuery {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Not authorized to view patient records")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
