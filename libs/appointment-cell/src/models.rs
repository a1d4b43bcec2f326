use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

pub const PATIENT_PLACEHOLDER: &str = "Patient";
pub const DOCTOR_PLACEHOLDER: &str = "Doctor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Booked,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::InProgress => write!(f, "in-progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub queue_position: Option<i32>,
    pub estimated_wait_time: Option<i32>,
    pub symptoms: Option<String>,
}

/// `appointments` row with the patient profile and the doctor (and the
/// doctor's profile) embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRow {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub time_slot: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub queue_position: Option<i32>,
    #[serde(default)]
    pub estimated_wait_time: Option<i32>,
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub patient: Option<Value>,
    #[serde(default)]
    pub doctor: Option<Value>,
}

fn embedded_name<'a>(value: Option<&'a Value>, placeholder: &'a str) -> &'a str {
    value
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(placeholder)
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        let patient_name = embedded_name(row.patient.as_ref(), PATIENT_PLACEHOLDER).to_string();
        let doctor_name = embedded_name(
            row.doctor.as_ref().and_then(|d| d.get("profiles")),
            DOCTOR_PLACEHOLDER,
        ).to_string();

        Self {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            patient_name,
            doctor_name,
            date: row.date,
            time_slot: row.time_slot.unwrap_or_default(),
            status: row.status,
            queue_position: row.queue_position,
            estimated_wait_time: row.estimated_wait_time,
            symptoms: row.symptoms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub symptoms: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub appointment: Appointment,
    pub queue_item_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeSlotQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleQuery {
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("{0} is not available for booking right now")]
    DoctorUnavailable(String),

    #[error("Please select date and time slot")]
    MissingDateOrSlot,

    #[error("Appointments cannot be booked in the past")]
    DateInPast,

    #[error("The clinic is closed on Sundays")]
    ClinicClosed,

    #[error("Unknown time slot: {0}")]
    UnknownTimeSlot(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error("This appointment belongs to another patient")]
    NotYourAppointment,

    #[error("Could not add the appointment to the queue: {0}")]
    QueueEntryFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Failed to parse appointment: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound | AppointmentError::DoctorNotFound => AppError::NotFound(e.to_string()),
            AppointmentError::MissingDateOrSlot
            | AppointmentError::DateInPast
            | AppointmentError::ClinicClosed
            | AppointmentError::UnknownTimeSlot(_) => AppError::ValidationError(e.to_string()),
            AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
            AppointmentError::NotYourAppointment => AppError::Forbidden(e.to_string()),
            AppointmentError::DoctorUnavailable(_) => AppError::Conflict(e.to_string()),
            AppointmentError::QueueEntryFailed(_) => AppError::ExternalService(e.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::ExternalService(msg),
            AppointmentError::Parse(err) => AppError::Internal(err.to_string()),
        }
    }
}
