use serde::{Deserialize, Serialize};

use appointment_cell::Appointment;
use doctor_cell::Doctor;
use queue_cell::{QueueCounts, QueueItem, WaitingEntry};

/// One dashboard per role, chosen once from the session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
    Patient(PatientDashboard),
    Doctor(DoctorDashboard),
    Compounder(CompounderDashboard),
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientDashboard {
    pub appointments: Vec<Appointment>,
    pub doctors: Vec<Doctor>,
    pub available_doctors: usize,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub doctor: Doctor,
    pub today_appointments: usize,
    pub counts: QueueCounts,
    pub current_patient: Option<QueueItem>,
    pub waiting: Vec<WaitingEntry>,
    pub schedule: Vec<Appointment>,
    /// False while a consultation is in progress.
    pub can_start_next: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompounderCounts {
    pub today_appointments: usize,
    pub waiting: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl CompounderCounts {
    pub fn new(today_appointments: usize, queue: QueueCounts) -> Self {
        Self {
            today_appointments,
            waiting: queue.waiting,
            in_progress: queue.in_progress,
            completed: queue.completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompounderDashboard {
    pub counts: CompounderCounts,
    pub doctors: Vec<Doctor>,
    pub queue: Vec<QueueItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub doctor_id: Option<String>,
}
