use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Doctor, DoctorError, DoctorRow, DoctorStatus};

const DOCTOR_SELECT: &str = "*,profiles!doctors_user_id_fkey(name,avatar)";

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch(&self, filter: &str, auth_token: &str) -> Result<Vec<Doctor>, DoctorError> {
        let path = format!("/rest/v1/doctors?select={}{}", DOCTOR_SELECT, filter);

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| Ok(Doctor::from(serde_json::from_value::<DoctorRow>(row)?)))
            .collect()
    }

    /// Every doctor with profile name and avatar.
    pub async fn list_doctors(&self, auth_token: &str) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Fetching doctors");
        self.fetch("", auth_token).await
    }

    pub async fn get_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor {}", doctor_id);
        self.fetch(&format!("&id=eq.{}", doctor_id), auth_token)
            .await?
            .into_iter()
            .next()
            .ok_or(DoctorError::NotFound)
    }

    /// Doctor row belonging to a signed-in user.
    pub async fn find_by_user(&self, user_id: &str, auth_token: &str) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor profile for user {}", user_id);
        self.fetch(&format!("&user_id=eq.{}", user_id), auth_token)
            .await?
            .into_iter()
            .next()
            .ok_or(DoctorError::NoDoctorProfile)
    }

    pub async fn update_status(
        &self,
        doctor_id: Uuid,
        status: DoctorStatus,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let updated = self.supabase.update_by_id(
            "doctors",
            &doctor_id.to_string(),
            json!({ "status": status }),
            auth_token,
        ).await.map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(DoctorError::NotFound);
        }

        info!("Doctor {} status set to {}", doctor_id, status);
        self.get_doctor(doctor_id, auth_token).await
    }
}
