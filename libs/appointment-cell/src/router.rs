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

pub fn appointment_routes(state: Arc<AppConfig>, feed: ChangeFeed) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/time-slots", get(handlers::get_time_slots))
        .route("/mine", get(handlers::get_my_appointments))
        .route("/today", get(handlers::get_today_schedule))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(Extension(feed))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
