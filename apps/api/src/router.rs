use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use dashboard_cell::router::dashboard_routes;
use doctor_cell::router::doctor_routes;
use notification_cell::router::notification_routes;
use queue_cell::router::queue_routes;
use queue_cell::QueueBoard;
use shared_config::AppConfig;
use shared_database::ChangeFeed;

pub fn create_router(state: Arc<AppConfig>, feed: ChangeFeed, board: QueueBoard) -> Router {
    Router::new()
        .route("/", get(|| async { "MediQueue API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone(), feed.clone()))
        .nest("/queue", queue_routes(state.clone(), board.clone()))
        .nest("/appointments", appointment_routes(state.clone(), feed.clone()))
        .nest("/notifications", notification_routes(state.clone(), feed))
        .nest("/dashboard", dashboard_routes(state, board))
}
