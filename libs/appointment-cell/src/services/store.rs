use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentChanges, NewAppointment};
use crate::services::ports::AppointmentStore;

/// `appointments` table over PostgREST.
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
    auth_token: String,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            auth_token: auth_token.to_string(),
        }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(&self.auth_token),
            None,
        ).await?;

        parse_rows(result)
    }
}

fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                error!("Failed to parse appointment row: {}", e);
                anyhow!("Failed to parse appointment: {}", e)
            })
        })
        .collect()
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn get(&self, appointment_id: i64) -> Result<Option<Appointment>> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", appointment_id);
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn list_for_dentist_on(&self, dentist_id: i64, date: NaiveDate) -> Result<Vec<Appointment>> {
        debug!("Fetching appointments of dentist {} on {}", dentist_id, date);

        let path = format!(
            "/rest/v1/appointments?dentist_id=eq.{}&date=eq.{}&status=neq.cancelled&order=id.asc",
            dentist_id, date
        );
        self.fetch(&path).await
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Appointment>> {
        debug!("Fetching appointments of patient {}", patient_id);

        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=date.asc,time.asc",
            patient_id
        );
        self.fetch(&path).await
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment> {
        debug!(
            "Inserting appointment for patient {} with dentist {} at {} {}",
            appointment.patient_id, appointment.dentist_id, appointment.date, appointment.time
        );

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(&self.auth_token),
            Some(serde_json::to_value(&appointment)?),
            Some(SupabaseClient::return_representation()),
        ).await?;

        parse_rows(result)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create appointment"))
    }

    async fn update(&self, appointment_id: i64, changes: AppointmentChanges) -> Result<Appointment> {
        debug!("Updating appointment {}: {:?}", appointment_id, changes);

        let mut body = serde_json::to_value(&changes)?;
        if let Value::Object(map) = &mut body {
            map.insert(
                "updated_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(&self.auth_token),
            Some(body),
            Some(SupabaseClient::return_representation()),
        ).await?;

        parse_rows(result)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Appointment {} was not updated", appointment_id))
    }
}
