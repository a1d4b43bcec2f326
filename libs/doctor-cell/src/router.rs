use std::sync::Arc;

use axum::{
    Extension,
    Router,
    routing::{get, put},
    middleware,
};

use shared_config::AppConfig;
use shared_database::ChangeFeed;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>, feed: ChangeFeed) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/me", get(handlers::get_my_profile))
        .route("/me/status", put(handlers::update_my_status))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .layer(Extension(feed))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
