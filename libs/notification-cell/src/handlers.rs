use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{ChangeFeed, Table};
use shared_models::auth::{Role, Session};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::SendNotificationRequest;
use crate::services::notification::unread_count;
use crate::services::NotificationService;

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    let notification_service = NotificationService::new(&state);
    let notifications = notification_service.list_for_user(&session.user_id, auth.token()).await?;

    Ok(Json(json!({
        "unread": unread_count(&notifications),
        "notifications": notifications
    })))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<Arc<AppConfig>>,
    Path(notification_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(feed): Extension<ChangeFeed>,
) -> Result<Json<Value>, AppError> {
    let notification_service = NotificationService::new(&state);
    let notification = notification_service.mark_read(notification_id, auth.token()).await?;
    feed.publish(Table::Notifications, Some(notification.user_id)).await;

    Ok(Json(json!({
        "success": true,
        "notification": notification
    })))
}

#[axum::debug_handler]
pub async fn send_notification(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(feed): Extension<ChangeFeed>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&session, &[Role::Compounder])?;

    let notification_service = NotificationService::new(&state);
    let notification = notification_service.send(&session.user_id, &request, auth.token()).await?;
    feed.publish(Table::Notifications, request.patient_id).await;

    Ok(Json(json!({
        "success": true,
        "notification": notification,
        "message": format!("Message sent to {}", request.patient_name)
    })))
}
