use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::DoctorService;
use shared_config::AppConfig;
use shared_models::auth::{Role, Session};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{QueueQuery, QueueScope, UpdateQueueStatusRequest};
use crate::services::{QueueBoard, StartPolicy};

/// Who is looking at the queue decides which slice they see and how
/// strictly "start" is checked. Doctors are pinned to their own queue;
/// the front desk picks a doctor or sees everyone.
pub async fn caller_scope(
    state: &AppConfig,
    session: &Session,
    doctor_filter: Option<&str>,
    auth_token: &str,
) -> Result<(QueueScope, StartPolicy), AppError> {
    match require_role(session, &[Role::Doctor, Role::Compounder])? {
        Role::Doctor => {
            let doctor = DoctorService::new(state).find_by_user(&session.user_id, auth_token).await?;
            Ok((QueueScope::Doctor(doctor.id), StartPolicy::SingleConsultation))
        }
        _ => {
            let scope = QueueScope::from_filter(doctor_filter)
                .map_err(|_| AppError::BadRequest("Invalid doctor filter".to_string()))?;
            Ok((scope, StartPolicy::Unrestricted))
        }
    }
}

#[axum::debug_handler]
pub async fn get_queue(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(board): Extension<QueueBoard>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let (scope, _) = caller_scope(&state, &session, query.doctor_id.as_deref(), token).await?;

    let projection = board.snapshot(scope, token).await?;
    let items = projection.filter_by_search_term(query.search.as_deref().unwrap_or_default());
    debug!("Queue {:?}: {} of {} items match", scope, items.len(), projection.len());

    Ok(Json(json!({
        "items": items,
        "counts": projection.counts(),
        "current": projection.current(),
        "waiting": projection.waiting_entries(),
        "version": projection.version()
    })))
}

#[axum::debug_handler]
pub async fn get_counts(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(board): Extension<QueueBoard>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let (scope, _) = caller_scope(&state, &session, query.doctor_id.as_deref(), token).await?;
    let projection = board.snapshot(scope, token).await?;

    Ok(Json(json!(projection.counts())))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    Path(item_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(board): Extension<QueueBoard>,
    Json(request): Json<UpdateQueueStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let (scope, _) = caller_scope(&state, &session, None, token).await?;

    let item = board.update_status(scope, item_id, request.status, token).await?;

    Ok(Json(json!({
        "success": true,
        "item": item
    })))
}

#[axum::debug_handler]
pub async fn start_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(item_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(board): Extension<QueueBoard>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let (scope, policy) = caller_scope(&state, &session, None, token).await?;

    let item = board.start(scope, item_id, policy, token).await?;

    Ok(Json(json!({
        "success": true,
        "item": item,
        "message": format!("Consultation started with {}", item.patient_name)
    })))
}

#[axum::debug_handler]
pub async fn complete_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(item_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(board): Extension<QueueBoard>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let (scope, _) = caller_scope(&state, &session, None, token).await?;

    let item = board.complete(scope, item_id, token).await?;

    Ok(Json(json!({
        "success": true,
        "item": item,
        "message": format!("Consultation with {} completed", item.patient_name)
    })))
}
