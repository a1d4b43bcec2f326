use std::sync::Arc;

use axum::{
    Extension,
    Router,
    routing::get,
    middleware,
};

use queue_cell::QueueBoard;
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn dashboard_routes(state: Arc<AppConfig>, board: QueueBoard) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::get_dashboard))
        .layer(Extension(board))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
