use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{ChangeFeed, Table};
use shared_models::auth::{Role, Session};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::UpdateDoctorStatusRequest;
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);
    let doctors = doctor_service.list_doctors(auth.token()).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.get_doctor(doctor_id, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

/// The signed-in doctor's own record.
#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    require_role(&session, &[Role::Doctor])?;

    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.find_by_user(&session.user_id, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_my_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(feed): Extension<ChangeFeed>,
    Json(request): Json<UpdateDoctorStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&session, &[Role::Doctor])?;
    let token = auth.token();

    let doctor_service = DoctorService::new(&state);
    let current = doctor_service.find_by_user(&session.user_id, token).await?;
    let status = request.status.unwrap_or_else(|| current.status.next());

    let doctor = doctor_service.update_status(current.id, status, token).await?;
    feed.publish(Table::Doctors, Some(doctor.id)).await;
    info!("Doctor {} is now {}", doctor.id, status);

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": format!("Your status is now: {}", status)
    })))
}
