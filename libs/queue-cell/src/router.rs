use std::sync::Arc;

use axum::{
    Extension,
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::QueueBoard;

pub fn queue_routes(state: Arc<AppConfig>, board: QueueBoard) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::get_queue))
        .route("/counts", get(handlers::get_counts))
        .route("/{item_id}/status", patch(handlers::update_status))
        .route("/{item_id}/start", post(handlers::start_consultation))
        .route("/{item_id}/complete", post(handlers::complete_consultation))
        .layer(Extension(board))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
