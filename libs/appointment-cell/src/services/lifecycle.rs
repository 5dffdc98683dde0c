// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::messages::MessageCode;
use crate::models::{AppointmentError, AppointmentStatus, SchedulingRules};

#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidState(MessageCode::InvalidStatus));
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Attended,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Attended | AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Only confirmed appointments may be rescheduled.
    pub fn ensure_editable(&self, current_status: AppointmentStatus) -> Result<(), AppointmentError> {
        if current_status != AppointmentStatus::Confirmed {
            warn!("Edit rejected for appointment in status {}", current_status);
            return Err(AppointmentError::InvalidState(MessageCode::InvalidStatus));
        }
        Ok(())
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppointmentError::ValidationError(MessageCode::InvalidDate))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(value: &str) -> Result<NaiveTime, AppointmentError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppointmentError::ValidationError(MessageCode::InvalidTime))
}

/// Today is bookable; anything strictly earlier is not.
pub fn validate_booking_date(date: NaiveDate, today: NaiveDate) -> Result<(), AppointmentError> {
    if date < today {
        return Err(AppointmentError::ValidationError(MessageCode::PastDate));
    }
    Ok(())
}

/// Trims the reason and drops it when blank.
pub fn normalize_reason(
    reason: Option<String>,
    rules: &SchedulingRules,
) -> Result<Option<String>, AppointmentError> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    if let Some(text) = &reason {
        if text.chars().count() > rules.max_reason_length {
            return Err(AppointmentError::ValidationError(MessageCode::ReasonTooLong));
        }
    }

    Ok(reason)
}
