use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use dentist_cell::{Dentist, DentistService};
use notification_cell::{NewNotification, NotificationError, NotificationService};
use patient_cell::{Patient, PatientService};
use shared_config::AppConfig;

use crate::models::{Appointment, AppointmentChanges, NewAppointment};

/// Appointment persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get(&self, appointment_id: i64) -> Result<Option<Appointment>>;

    /// Non-cancelled appointments of a dentist on a date, ordered by id.
    async fn list_for_dentist_on(&self, dentist_id: i64, date: NaiveDate) -> Result<Vec<Appointment>>;

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>>;

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment>;

    async fn update(&self, appointment_id: i64, changes: AppointmentChanges) -> Result<Appointment>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientLookup: Send + Sync {
    async fn find_patient(&self, patient_id: i64) -> Result<Option<Patient>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DentistLookup: Send + Sync {
    async fn find_dentist(&self, dentist_id: i64) -> Result<Option<Dentist>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: NewNotification) -> Result<(), NotificationError>;
}

// Adapters over the sibling cells. Each carries the caller's token so that
// row level security applies to every downstream read and write.

pub struct PatientDirectory {
    service: PatientService,
    auth_token: String,
}

impl PatientDirectory {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            service: PatientService::new(config),
            auth_token: auth_token.to_string(),
        }
    }
}

#[async_trait]
impl PatientLookup for PatientDirectory {
    async fn find_patient(&self, patient_id: i64) -> Result<Option<Patient>> {
        self.service.get_patient(patient_id, &self.auth_token).await
    }
}

pub struct DentistDirectory {
    service: DentistService,
    auth_token: String,
}

impl DentistDirectory {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            service: DentistService::new(config),
            auth_token: auth_token.to_string(),
        }
    }
}

#[async_trait]
impl DentistLookup for DentistDirectory {
    async fn find_dentist(&self, dentist_id: i64) -> Result<Option<Dentist>> {
        self.service.get_dentist(dentist_id, &self.auth_token).await
    }
}

pub struct InAppNotifier {
    service: NotificationService,
    auth_token: String,
}

impl InAppNotifier {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            service: NotificationService::new(config),
            auth_token: auth_token.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for InAppNotifier {
    async fn send(&self, notification: NewNotification) -> Result<(), NotificationError> {
        self.service.send(notification, &self.auth_token).await.map(|_| ())
    }
}
