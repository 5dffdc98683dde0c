use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dentist {
    pub id: i64,
    pub user_id: String,
    pub fullname: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    /// Inactive dentists keep their history but take no new bookings.
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DentistListQuery {
    pub include_inactive: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum DentistError {
    #[error("Dentist not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
