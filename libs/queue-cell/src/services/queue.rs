use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use shared_database::{ChangeFeed, Table};

use crate::error::QueueError;
use crate::models::{QueueItem, QueueStatus};
use crate::services::projection::QueueProjection;
use crate::services::store::QueueStore;

/// Whether starting a consultation must wait for the current one to end.
///
/// The doctor's own view refuses a second concurrent consultation; the
/// front desk can start anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    SingleConsultation,
    Unrestricted,
}

/// Applies status transitions to a projection: validate, write to the
/// store, and only then change the local item.
pub struct QueueService {
    store: Arc<dyn QueueStore>,
    feed: ChangeFeed,
}

impl QueueService {
    pub fn new(store: Arc<dyn QueueStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    pub async fn update_status(
        &self,
        projection: &mut QueueProjection,
        item_id: Uuid,
        new_status: QueueStatus,
        auth_token: &str,
    ) -> Result<QueueItem, QueueError> {
        let current = projection
            .get(item_id)
            .ok_or(QueueError::ItemNotFound(item_id))?;

        if !current.status.can_transition_to(&new_status) {
            warn!("Rejected queue transition {} -> {} for item {}", current.status, new_status, item_id);
            return Err(QueueError::InvalidStatusTransition {
                from: current.status,
                to: new_status,
            });
        }
        let appointment_id = current.appointment_id;

        if let Err(e) = self.store.update_status(item_id, new_status, auth_token).await {
            error!("Queue item {} update to {} failed: {}", item_id, new_status, e);
            return Err(e);
        }

        let updated = projection
            .set_status(item_id, new_status)
            .cloned()
            .ok_or(QueueError::ItemNotFound(item_id))?;
        info!("Queue item {} is now {}", item_id, new_status);

        // The appointment follows the queue; the two writes are not atomic.
        if let Err(e) = self.store.mirror_to_appointment(appointment_id, new_status, auth_token).await {
            warn!("Appointment {} did not follow queue item {}: {}", appointment_id, item_id, e);
        } else {
            self.feed.publish(Table::Appointments, None).await;
        }
        self.feed.publish(Table::QueueItems, None).await;

        Ok(updated)
    }

    /// `waiting -> in-progress`, honouring `policy`.
    pub async fn start(
        &self,
        projection: &mut QueueProjection,
        item_id: Uuid,
        policy: StartPolicy,
        auth_token: &str,
    ) -> Result<QueueItem, QueueError> {
        if policy == StartPolicy::SingleConsultation && projection.has_consultation_in_progress() {
            return Err(QueueError::ConsultationInProgress);
        }
        self.update_status(projection, item_id, QueueStatus::InProgress, auth_token).await
    }

    /// `in-progress -> completed`.
    pub async fn complete(
        &self,
        projection: &mut QueueProjection,
        item_id: Uuid,
        auth_token: &str,
    ) -> Result<QueueItem, QueueError> {
        self.update_status(projection, item_id, QueueStatus::Completed, auth_token).await
    }
}
