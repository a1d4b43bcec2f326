use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

pub const SENT_TITLE: &str = "Patient Notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(rename(deserialize = "created_at"))]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// The two messages the front desk can send to a patient in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CannedMessage {
    TurnComingUp,
    ContactReception,
}

impl CannedMessage {
    pub fn text(&self) -> &'static str {
        match self {
            CannedMessage::TurnComingUp => "Your turn is coming up in 5 minutes",
            CannedMessage::ContactReception => "Please contact the reception",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendNotificationRequest {
    pub patient_name: String,
    /// When known, the patient also gets the message in their own list.
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    pub message: CannedMessage,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Failed to parse notification: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<NotificationError> for AppError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::NotFound => AppError::NotFound(e.to_string()),
            NotificationError::DatabaseError(msg) => AppError::ExternalService(msg),
            NotificationError::Parse(err) => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_maps_created_at_to_timestamp() {
        let notification: Notification = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "title": "Queue Update",
            "message": "You are next",
            "type": "warning",
            "created_at": "2026-01-05T09:00:00Z",
            "read": false
        })).unwrap();

        assert_eq!(notification.kind, NotificationType::Warning);
        let out = serde_json::to_value(&notification).unwrap();
        assert_eq!(out["timestamp"], "2026-01-05T09:00:00Z");
        assert_eq!(out["type"], "warning");
    }

    #[test]
    fn canned_messages() {
        let parsed: CannedMessage = serde_json::from_value(json!("turn_coming_up")).unwrap();
        assert_eq!(parsed.text(), "Your turn is coming up in 5 minutes");
        assert_eq!(CannedMessage::ContactReception.text(), "Please contact the reception");
        assert!(serde_json::from_value::<CannedMessage>(json!("anything else")).is_err());
    }
}
