use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

pub const DOCTOR_PLACEHOLDER: &str = "Doctor";

/// Set by the doctor by hand. Never derived from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorStatus {
    Available,
    Busy,
    Away,
}

impl DoctorStatus {
    /// The dashboard's "Update Status" button steps through the statuses.
    pub fn next(&self) -> DoctorStatus {
        match self {
            DoctorStatus::Available => DoctorStatus::Busy,
            DoctorStatus::Busy => DoctorStatus::Away,
            DoctorStatus::Away => DoctorStatus::Available,
        }
    }
}

impl fmt::Display for DoctorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoctorStatus::Available => write!(f, "available"),
            DoctorStatus::Busy => write!(f, "busy"),
            DoctorStatus::Away => write!(f, "away"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub specialization: String,
    pub experience: i32,
    pub rating: f64,
    pub consultation_time: i32,
    pub status: DoctorStatus,
    pub avatar: Option<String>,
}

impl Doctor {
    pub fn is_available(&self) -> bool {
        self.status == DoctorStatus::Available
    }

    /// "Dr. Sarah Johnson" -> "DSJ"
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }
}

/// `doctors` row with the doctor's profile embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    #[serde(default)]
    pub experience: i32,
    #[serde(default, deserialize_with = "numeric")]
    pub rating: f64,
    #[serde(default)]
    pub consultation_time: i32,
    pub status: DoctorStatus,
    #[serde(default)]
    pub profiles: Option<Value>,
}

// PostgREST returns `numeric` columns as strings.
fn numeric<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_f64().unwrap_or_default()),
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!("expected a number, got {}", other))),
    }
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        let profile = row.profiles.unwrap_or(Value::Null);

        let name = profile
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(DOCTOR_PLACEHOLDER)
            .to_string();

        let avatar = profile
            .get("avatar")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            id: row.id,
            user_id: row.user_id,
            name,
            specialization: row.specialization,
            experience: row.experience,
            rating: row.rating,
            consultation_time: row.consultation_time,
            status: row.status,
            avatar,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDoctorStatusRequest {
    /// Omitted means "step to the next status".
    #[serde(default)]
    pub status: Option<DoctorStatus>,
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("No doctor profile is linked to this account")]
    NoDoctorProfile,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Failed to parse doctor: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound | DoctorError::NoDoctorProfile => AppError::NotFound(e.to_string()),
            DoctorError::DatabaseError(msg) => AppError::ExternalService(msg),
            DoctorError::Parse(err) => AppError::Internal(err.to_string()),
        }
    }
}
