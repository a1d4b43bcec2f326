use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Notification, NotificationError, NotificationType, SendNotificationRequest, SENT_TITLE};

pub struct NotificationService {
    supabase: Arc<SupabaseClient>,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Newest first.
    pub async fn list_for_user(&self, user_id: &str, auth_token: &str) -> Result<Vec<Notification>, NotificationError> {
        debug!("Fetching notifications for user {}", user_id);

        let path = format!("/rest/v1/notifications?user_id=eq.{}&order=created_at.desc", user_id);
        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| Ok(serde_json::from_value(row)?))
            .collect()
    }

    /// Marking read is the only change a notification ever sees.
    pub async fn mark_read(&self, notification_id: Uuid, auth_token: &str) -> Result<Notification, NotificationError> {
        let updated = self.supabase.update_by_id(
            "notifications",
            &notification_id.to_string(),
            json!({ "read": true }),
            auth_token,
        ).await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let row = updated.into_iter().next().ok_or(NotificationError::NotFound)?;
        Ok(serde_json::from_value(row)?)
    }

    async fn create(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        kind: NotificationType,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        let created = self.supabase.insert(
            "notifications",
            json!({
                "user_id": user_id,
                "title": title,
                "message": message,
                "type": kind,
                "read": false
            }),
            auth_token,
        ).await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let row = created
            .into_iter()
            .next()
            .ok_or_else(|| NotificationError::DatabaseError("Notification was not returned".to_string()))?;
        Ok(serde_json::from_value(row)?)
    }

    /// Front-desk message to a queued patient. The sender's own list keeps
    /// a record of what was sent; the patient gets the message when their
    /// id is known.
    pub async fn send(
        &self,
        sender_id: &str,
        request: &SendNotificationRequest,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        let text = request.message.text();
        let record = format!("Notification sent to {}: {}", request.patient_name, text);

        let sent = self.create(sender_id, SENT_TITLE, &record, NotificationType::Success, auth_token).await?;
        info!("Notification sent to {}", request.patient_name);

        if let Some(patient_id) = request.patient_id {
            if let Err(e) = self
                .create(&patient_id.to_string(), "Queue Update", text, NotificationType::Info, auth_token)
                .await
            {
                warn!("Could not deliver notification to patient {}: {}", patient_id, e);
            }
        }

        Ok(sent)
    }
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}
