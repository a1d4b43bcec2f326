use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const PATIENT_PLACEHOLDER: &str = "Patient";

/// Where a patient is in their visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueStatus {
    Waiting,
    InProgress,
    Completed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::InProgress => "in-progress",
            QueueStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed)
    }

    pub fn can_transition_to(&self, target: &QueueStatus) -> bool {
        use QueueStatus::*;
        matches!((self, target), (Waiting, InProgress) | (InProgress, Completed))
    }

    /// The single status reachable from this one, if any.
    pub fn next(&self) -> Option<QueueStatus> {
        match self {
            QueueStatus::Waiting => Some(QueueStatus::InProgress),
            QueueStatus::InProgress => Some(QueueStatus::Completed),
            QueueStatus::Completed => None,
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(QueueStatus::Waiting),
            "in-progress" => Ok(QueueStatus::InProgress),
            "completed" => Ok(QueueStatus::Completed),
            other => Err(format!("unknown queue status: {}", other)),
        }
    }
}

/// A queue entry as the dashboards see it, with the patient name and slot
/// taken from the owning appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub time_slot: String,
    pub status: QueueStatus,
    pub estimated_time: Option<i32>,
}

/// `queue_items` row with its appointment and patient profile embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueItemRow {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub status: QueueStatus,
    pub estimated_time: Option<i32>,
    #[serde(default)]
    pub appointment: Option<Value>,
}

impl From<QueueItemRow> for QueueItem {
    fn from(row: QueueItemRow) -> Self {
        let appointment = row.appointment.unwrap_or(Value::Null);

        let patient_name = appointment
            .get("patient")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(PATIENT_PLACEHOLDER)
            .to_string();

        let time_slot = appointment
            .get("time_slot")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            id: row.id,
            appointment_id: row.appointment_id,
            patient_name,
            time_slot,
            status: row.status,
            estimated_time: row.estimated_time,
        }
    }
}

/// Which slice of the clinic queue a projection covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueScope {
    All,
    Doctor(Uuid),
}

impl QueueScope {
    /// `None` and the compounder's `"all"` selector both mean every doctor.
    pub fn from_filter(doctor_id: Option<&str>) -> Result<Self, uuid::Error> {
        match doctor_id.map(str::trim) {
            None | Some("") | Some("all") => Ok(QueueScope::All),
            Some(id) => Ok(QueueScope::Doctor(Uuid::parse_str(id)?)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub waiting: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQueueStatusRequest {
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueQuery {
    pub doctor_id: Option<String>,
    pub search: Option<String>,
}

/// Position in the waiting list, 1-based, as shown on the dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct WaitingEntry {
    pub position: usize,
    #[serde(flatten)]
    pub item: QueueItem,
}
