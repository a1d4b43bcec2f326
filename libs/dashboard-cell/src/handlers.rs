use std::sync::Arc;

use axum::{
    extract::{Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{Authorization, authorization::Bearer};

use queue_cell::QueueBoard;
use shared_config::AppConfig;
use shared_models::auth::Session;
use shared_models::error::AppError;

use crate::models::{Dashboard, DashboardQuery};
use crate::services::DashboardService;

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(session): Extension<Session>,
    Extension(board): Extension<QueueBoard>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = DashboardService::new(&state, board)
        .build(&session, &query, Utc::now().date_naive(), auth.token())
        .await?;

    Ok(Json(dashboard))
}
