use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::Dentist;

pub struct DentistService {
    supabase: SupabaseClient,
}

impl DentistService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Get dentist by role-table id, `None` when it does not exist
    pub async fn get_dentist(
        &self,
        dentist_id: i64,
        auth_token: &str,
    ) -> Result<Option<Dentist>> {
        debug!("Fetching dentist record: {}", dentist_id);

        let path = format!("/rest/v1/dentists?id=eq.{}&limit=1", dentist_id);
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

    pub async fn list_dentists(
        &self,
        include_inactive: bool,
        auth_token: &str,
    ) -> Result<Vec<Dentist>> {
        debug!("Listing dentists (include_inactive: {})", include_inactive);

        let path = if include_inactive {
            "/rest/v1/dentists?order=fullname.asc".to_string()
        } else {
            "/rest/v1/dentists?is_active=eq.true&order=fullname.asc".to_string()
        };

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let dentists = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Dentist>, _>>()?;

        Ok(dentists)
    }
}
