// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_config::AppConfig;

use crate::messages::MessageCode;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub dentist_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    /// Prior visit this appointment follows up on.
    #[serde(default)]
    pub follow_up_of: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Whether this appointment still holds its slot.
    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Attended,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Attended => write!(f, "attended"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Row to insert; the store assigns `id` and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub dentist_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub follow_up_of: Option<i64>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dentist_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}

impl AppointmentChanges {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

// Dates and times arrive as text so malformed values surface as validation
// errors with a message code instead of extractor rejections.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: i64,
    pub dentist_id: i64,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpAppointmentRequest {
    pub previous_appointment_id: i64,
    /// Defaults to the dentist of the previous visit.
    pub dentist_id: Option<i64>,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditAppointmentRequest {
    pub dentist_id: i64,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotCheckQuery {
    pub dentist_id: i64,
    pub date: String,
    pub time: String,
}

// ==============================================================================
// CONFLICT DETECTION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotAvailability {
    pub dentist_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub available: bool,
    pub conflicting_appointment_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreeSlots {
    pub dentist_id: i64,
    pub date: NaiveDate,
    pub slot_minutes: u32,
    pub free: Vec<NaiveTime>,
    pub taken: Vec<NaiveTime>,
}

/// Result of a successful state change, with the confirmation to show.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentOutcome {
    pub appointment: Appointment,
    pub message: MessageCode,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Unauthorized: {0}")]
    Unauthorized(MessageCode),

    #[error("Not found: {0}")]
    NotFound(MessageCode),

    #[error("Validation error: {0}")]
    ValidationError(MessageCode),

    #[error("Invalid state: {0}")]
    InvalidState(MessageCode),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppointmentError {
    pub fn message_code(&self) -> MessageCode {
        match self {
            AppointmentError::Unauthorized(code)
            | AppointmentError::NotFound(code)
            | AppointmentError::ValidationError(code)
            | AppointmentError::InvalidState(code) => *code,
            AppointmentError::Unexpected(_) => MessageCode::Unexpected,
        }
    }
}

// ==============================================================================
// SCHEDULING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulingRules {
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_minutes: u32,
    pub max_reason_length: usize,
}

impl SchedulingRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            opening_time: config.clinic_opening_time,
            closing_time: config.clinic_closing_time,
            slot_minutes: config.slot_minutes,
            ..Self::default()
        }
    }
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
            max_reason_length: 500,
        }
    }
}
