use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Patient, PatientSearchQuery};

/// Read-only access to patient role records.
pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Returns `None` when no patient carries this role-table id.
    pub async fn get_patient(
        &self,
        patient_id: i64,
        auth_token: &str,
    ) -> Result<Option<Patient>> {
        debug!("Fetching patient record: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}&limit=1", patient_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    pub async fn search_patients(
        &self,
        query: PatientSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Patient>> {
        debug!("Searching patients with query: {:?}", query);

        let mut query_parts = vec!["order=fullname.asc".to_string()];

        if let Some(name) = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            query_parts.push(format!("fullname=ilike.*{}*", urlencoding::encode(name)));
        }
        if let Some(phone) = query.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            query_parts.push(format!("phone=like.*{}*", urlencoding::encode(phone)));
        }

        query_parts.push(format!("limit={}", query.limit.unwrap_or(50).clamp(1, 200)));
        query_parts.push(format!("offset={}", query.offset.unwrap_or(0).max(0)));

        let path = format!("/rest/v1/patients?{}", query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let patients = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Patient>, _>>()?;

        Ok(patients)
    }
}
