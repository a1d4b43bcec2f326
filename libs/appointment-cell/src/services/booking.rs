use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use doctor_cell::{DoctorError, DoctorService};
use queue_cell::{QueueStore, SupabaseQueueStore};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentRow, AppointmentStatus, BookAppointmentRequest,
    BookingConfirmation,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::slots::{confirmation_message, slot_index, validate_selection};

const APPOINTMENT_SELECT: &str = "*,patient:profiles!appointments_patient_id_fkey(name),doctor:doctors!appointments_doctor_id_fkey(id,profiles!doctors_user_id_fkey(name))";

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    queue_store: Arc<dyn QueueStore>,
    doctor_service: DoctorService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let queue_store = Arc::new(SupabaseQueueStore::with_client(Arc::clone(&supabase)));
        Self::with_queue_store(supabase, queue_store)
    }

    pub fn with_queue_store(supabase: Arc<SupabaseClient>, queue_store: Arc<dyn QueueStore>) -> Self {
        Self {
            doctor_service: DoctorService::with_client(Arc::clone(&supabase)),
            lifecycle_service: AppointmentLifecycleService::new(),
            supabase,
            queue_store,
        }
    }

    /// Book a slot and put the patient in the doctor's queue.
    ///
    /// Only doctors whose status is `available` take bookings. The
    /// appointment row is written first, then its queue entry. When the
    /// queue entry cannot be created the appointment is cancelled again.
    pub async fn book_appointment(
        &self,
        patient_id: &str,
        request: BookAppointmentRequest,
        today: NaiveDate,
        auth_token: &str,
    ) -> Result<BookingConfirmation, AppointmentError> {
        let (date, time_slot) = validate_selection(request.date, request.time_slot.as_deref(), today)?;

        let doctor = self.doctor_service
            .get_doctor(request.doctor_id, auth_token)
            .await
            .map_err(|e| match e {
                DoctorError::NotFound => AppointmentError::DoctorNotFound,
                other => AppointmentError::DatabaseError(other.to_string()),
            })?;

        if !doctor.is_available() {
            warn!("Booking refused: doctor {} is {}", doctor.id, doctor.status);
            return Err(AppointmentError::DoctorUnavailable(doctor.name));
        }

        info!("Booking {} {} with doctor {} for patient {}", date, time_slot, doctor.id, patient_id);

        let created = self.supabase.insert(
            "appointments",
            json!({
                "patient_id": patient_id,
                "doctor_id": doctor.id,
                "date": date,
                "time_slot": time_slot,
                "status": AppointmentStatus::Booked,
                "symptoms": request.symptoms
            }),
            auth_token,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = created
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Appointment was not returned".to_string()))?;
        let mut appointment = Appointment::from(serde_json::from_value::<AppointmentRow>(row)?);
        appointment.doctor_name = doctor.name.clone();

        let estimated_time = Some(doctor.consultation_time).filter(|minutes| *minutes > 0);
        let queue_item_id = match self.queue_store.create_entry(appointment.id, estimated_time, auth_token).await {
            Ok(id) => id,
            Err(e) => {
                error!("Queue entry for appointment {} failed: {}", appointment.id, e);
                self.withdraw(appointment.id, auth_token).await;
                return Err(AppointmentError::QueueEntryFailed(e.to_string()));
            }
        };

        let message = confirmation_message(&doctor.name, date, &time_slot);
        info!("Appointment {} booked, queue entry {}", appointment.id, queue_item_id);

        Ok(BookingConfirmation {
            appointment,
            queue_item_id,
            message,
        })
    }

    async fn withdraw(&self, appointment_id: Uuid, auth_token: &str) {
        let cancelled = self.supabase.update_by_id(
            "appointments",
            &appointment_id.to_string(),
            json!({ "status": AppointmentStatus::Cancelled }),
            auth_token,
        ).await;

        match cancelled {
            Ok(_) => warn!("Appointment {} cancelled after failed queue entry", appointment_id),
            Err(e) => error!("Appointment {} is booked without a queue entry: {}", appointment_id, e),
        }
    }

    async fn fetch(&self, filter: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?select={}{}", APPOINTMENT_SELECT, filter);

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| Ok(Appointment::from(serde_json::from_value::<AppointmentRow>(row)?)))
            .collect()
    }

    pub async fn get_appointment(&self, appointment_id: Uuid, auth_token: &str) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);
        self.fetch(&format!("&id=eq.{}", appointment_id), auth_token)
            .await?
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)
    }

    /// A patient's appointments, most recent date first.
    pub async fn list_for_patient(&self, patient_id: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments for patient {}", patient_id);
        self.fetch(&format!("&patient_id=eq.{}&order=date.desc,created_at.desc", patient_id), auth_token).await
    }

    /// Non-cancelled appointments on `date`, in slot order. `None` covers
    /// every doctor.
    pub async fn schedule_for(
        &self,
        doctor_id: Option<Uuid>,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut filter = format!("&date=eq.{}&status=neq.cancelled", date);
        if let Some(doctor_id) = doctor_id {
            filter.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }

        let mut appointments = self.fetch(&filter, auth_token).await?;
        appointments.sort_by_key(|a| slot_index(&a.time_slot));
        Ok(appointments)
    }

    /// Patient-side cancellation of a booked appointment.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        patient_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.get_appointment(appointment_id, auth_token).await?;

        if appointment.patient_id.to_string() != patient_id {
            return Err(AppointmentError::NotYourAppointment);
        }
        self.lifecycle_service
            .validate_status_transition(appointment.status, AppointmentStatus::Cancelled)?;

        self.supabase.update_by_id(
            "appointments",
            &appointment_id.to_string(),
            json!({ "status": AppointmentStatus::Cancelled }),
            auth_token,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        appointment.status = AppointmentStatus::Cancelled;
        info!("Appointment {} cancelled by patient", appointment_id);
        Ok(appointment)
    }
}
