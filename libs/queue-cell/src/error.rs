use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::QueueStatus;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Invalid queue status transition from {from} to {to}")]
    InvalidStatusTransition { from: QueueStatus, to: QueueStatus },

    #[error("Another patient is already in consultation")]
    ConsultationInProgress,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<QueueError> for AppError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::ItemNotFound(_) => AppError::NotFound(e.to_string()),
            QueueError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
            QueueError::ConsultationInProgress => AppError::Conflict(e.to_string()),
            QueueError::DatabaseError(msg) => AppError::ExternalService(msg),
            QueueError::SerializationError(err) => AppError::Internal(err.to_string()),
        }
    }
}
