use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::DoctorService;
use shared_config::AppConfig;
use shared_database::{ChangeFeed, Table};
use shared_models::auth::{Role, Session};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{BookAppointmentRequest, ScheduleQuery, TimeSlotQuery};
use crate::services::{is_bookable_date, AppointmentBookingService, TIME_SLOTS};

/// The fixed slot list, plus whether `date` can be booked when given.
pub async fn get_time_slots(Query(query): Query<TimeSlotQuery>) -> Json<Value> {
    let today = Utc::now().date_naive();

    Json(json!({
        "time_slots": TIME_SLOTS,
        "date": query.date,
        "bookable": query.date.map(|date| is_bookable_date(date, today))
    }))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(feed): Extension<ChangeFeed>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&session, &[Role::Patient])?;

    let booking_service = AppointmentBookingService::new(&state);
    let confirmation = booking_service
        .book_appointment(&session.user_id, request, Utc::now().date_naive(), auth.token())
        .await?;

    feed.publish(Table::Appointments, Some(confirmation.appointment.id)).await;
    feed.publish(Table::QueueItems, Some(confirmation.queue_item_id)).await;

    Ok(Json(json!({
        "success": true,
        "appointment": confirmation.appointment,
        "queue_item_id": confirmation.queue_item_id,
        "message": confirmation.message
    })))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Value>, AppError> {
    require_role(&session, &[Role::Patient])?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service.list_for_patient(&session.user_id, auth.token()).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

/// Today's schedule: the signed-in doctor's own, or for the front desk
/// every doctor's unless one is picked.
#[axum::debug_handler]
pub async fn get_today_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let doctor_id = match require_role(&session, &[Role::Doctor, Role::Compounder])? {
        Role::Doctor => Some(DoctorService::new(&state).find_by_user(&session.user_id, token).await?.id),
        _ => query.doctor_id,
    };

    let today = Utc::now().date_naive();
    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service.schedule_for(doctor_id, today, token).await?;

    Ok(Json(json!({
        "date": today,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(feed): Extension<ChangeFeed>,
) -> Result<Json<Value>, AppError> {
    require_role(&session, &[Role::Patient])?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointment = booking_service
        .cancel_appointment(appointment_id, &session.user_id, auth.token())
        .await?;

    feed.publish(Table::Appointments, Some(appointment.id)).await;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}
