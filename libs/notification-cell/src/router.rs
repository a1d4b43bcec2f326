use std::sync::Arc;

use axum::{
    Extension,
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_database::ChangeFeed;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn notification_routes(state: Arc<AppConfig>, feed: ChangeFeed) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/send", post(handlers::send_notification))
        .route("/{notification_id}/read", post(handlers::mark_read))
        .layer(Extension(feed))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
