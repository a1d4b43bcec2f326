use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use appointment_cell::AppointmentBookingService;
use doctor_cell::DoctorService;
use notification_cell::services::notification::unread_count;
use notification_cell::NotificationService;
use queue_cell::{QueueBoard, QueueScope};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{Role, Session};
use shared_models::error::AppError;

use crate::models::{
    CompounderCounts, CompounderDashboard, Dashboard, DashboardQuery, DoctorDashboard,
    PatientDashboard,
};

/// Assembles the role dashboards from the doctor directory, the
/// appointment book, notifications and the shared queue board.
pub struct DashboardService {
    doctors: DoctorService,
    appointments: AppointmentBookingService,
    notifications: NotificationService,
    board: QueueBoard,
}

impl DashboardService {
    pub fn new(config: &AppConfig, board: QueueBoard) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            doctors: DoctorService::with_client(Arc::clone(&supabase)),
            appointments: AppointmentBookingService::new(config),
            notifications: NotificationService::with_client(supabase),
            board,
        }
    }

    pub async fn build(
        &self,
        session: &Session,
        query: &DashboardQuery,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<Dashboard, AppError> {
        debug!("Building {} dashboard for {}", session.role, session.user_id);

        match session.role {
            Role::Patient => Ok(Dashboard::Patient(self.patient(&session.user_id, auth_token).await?)),
            Role::Doctor => Ok(Dashboard::Doctor(self.doctor(&session.user_id, today, auth_token).await?)),
            Role::Compounder => Ok(Dashboard::Compounder(self.compounder(query, today, auth_token).await?)),
        }
    }

    async fn patient(&self, user_id: &str, auth_token: &str) -> Result<PatientDashboard, AppError> {
        let appointments = self.appointments.list_for_patient(user_id, auth_token).await?;
        let doctors = self.doctors.list_doctors(auth_token).await?;
        let notifications = self.notifications.list_for_user(user_id, auth_token).await?;

        Ok(PatientDashboard {
            appointments,
            available_doctors: doctors.iter().filter(|d| d.is_available()).count(),
            doctors,
            unread_notifications: unread_count(&notifications),
        })
    }

    async fn doctor(&self, user_id: &str, today: NaiveDate, auth_token: &str) -> Result<DoctorDashboard, AppError> {
        let doctor = self.doctors.find_by_user(user_id, auth_token).await?;
        let projection = self.board.snapshot(QueueScope::Doctor(doctor.id), auth_token).await?;
        let schedule = self.appointments.schedule_for(Some(doctor.id), today, auth_token).await?;

        Ok(DoctorDashboard {
            doctor,
            today_appointments: schedule.len(),
            counts: projection.counts(),
            current_patient: projection.current().cloned(),
            waiting: projection.waiting_entries(),
            schedule,
            can_start_next: !projection.has_consultation_in_progress(),
        })
    }

    async fn compounder(
        &self,
        query: &DashboardQuery,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<CompounderDashboard, AppError> {
        let scope = QueueScope::from_filter(query.doctor_id.as_deref())
            .map_err(|_| AppError::BadRequest("Invalid doctor filter".to_string()))?;

        let clinic = self.board.snapshot(QueueScope::All, auth_token).await?;
        let filtered = match scope {
            QueueScope::All => clinic.clone(),
            scoped => self.board.snapshot(scoped, auth_token).await?,
        };
        let queue = filtered
            .filter_by_search_term(query.search.as_deref().unwrap_or_default())
            .into_iter()
            .cloned()
            .collect();

        let today_appointments = self.appointments.schedule_for(None, today, auth_token).await?.len();

        Ok(CompounderDashboard {
            counts: CompounderCounts::new(today_appointments, clinic.counts()),
            doctors: self.doctors.list_doctors(auth_token).await?,
            queue,
        })
    }
}
