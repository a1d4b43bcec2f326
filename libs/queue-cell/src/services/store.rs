use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::QueueError;
use crate::models::{QueueItem, QueueItemRow, QueueScope, QueueStatus};

/// The entity-store side of the queue.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn fetch_queue(&self, scope: QueueScope, auth_token: &str) -> Result<Vec<QueueItem>, QueueError>;

    async fn update_status(&self, item_id: Uuid, status: QueueStatus, auth_token: &str) -> Result<(), QueueError>;

    /// Create the waiting entry for a freshly booked appointment.
    async fn create_entry(
        &self,
        appointment_id: Uuid,
        estimated_time: Option<i32>,
        auth_token: &str,
    ) -> Result<Uuid, QueueError>;

    /// Carry a queue transition over to the owning appointment.
    async fn mirror_to_appointment(
        &self,
        appointment_id: Uuid,
        status: QueueStatus,
        auth_token: &str,
    ) -> Result<(), QueueError>;
}

// `!inner` lets the embedded appointment filter the queue rows themselves.
const QUEUE_SELECT: &str = "id,appointment_id,status,estimated_time,appointment:appointments!queue_items_appointment_id_fkey!inner(time_slot,doctor_id,status,patient:profiles!appointments_patient_id_fkey(name))";

pub struct SupabaseQueueStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseQueueStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn queue_path(scope: QueueScope) -> String {
        let base = format!(
            "/rest/v1/queue_items?select={}&appointment.status=neq.cancelled",
            QUEUE_SELECT
        );
        match scope {
            QueueScope::All => format!("{}&order=created_at.asc", base),
            QueueScope::Doctor(doctor_id) => format!(
                "{}&appointment.doctor_id=eq.{}&order=created_at.asc",
                base, doctor_id
            ),
        }
    }
}

#[async_trait]
impl QueueStore for SupabaseQueueStore {
    async fn fetch_queue(&self, scope: QueueScope, auth_token: &str) -> Result<Vec<QueueItem>, QueueError> {
        debug!("Fetching queue items for {:?}", scope);

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &Self::queue_path(scope),
            Some(auth_token),
            None,
        ).await.map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let row: QueueItemRow = serde_json::from_value(row)?;
                Ok(QueueItem::from(row))
            })
            .collect()
    }

    async fn update_status(&self, item_id: Uuid, status: QueueStatus, auth_token: &str) -> Result<(), QueueError> {
        debug!("Updating queue item {} to {}", item_id, status);

        let updated = self.supabase.update_by_id(
            "queue_items",
            &item_id.to_string(),
            json!({ "status": status }),
            auth_token,
        ).await.map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(QueueError::ItemNotFound(item_id));
        }

        Ok(())
    }

    async fn create_entry(
        &self,
        appointment_id: Uuid,
        estimated_time: Option<i32>,
        auth_token: &str,
    ) -> Result<Uuid, QueueError> {
        let created = self.supabase.insert(
            "queue_items",
            json!({
                "appointment_id": appointment_id,
                "status": QueueStatus::Waiting,
                "estimated_time": estimated_time
            }),
            auth_token,
        ).await.map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        let id = created
            .first()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str)
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| QueueError::DatabaseError("Queue entry was not returned".to_string()))?;

        info!("Queue entry {} created for appointment {}", id, appointment_id);
        Ok(id)
    }

    async fn mirror_to_appointment(
        &self,
        appointment_id: Uuid,
        status: QueueStatus,
        auth_token: &str,
    ) -> Result<(), QueueError> {
        debug!("Mirroring queue status {} onto appointment {}", status, appointment_id);

        self.supabase.update_by_id(
            "appointments",
            &appointment_id.to_string(),
            json!({ "status": status }),
            auth_token,
        ).await.map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
