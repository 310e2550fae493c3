use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/enhanced-appointment`.
pub fn booking_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/book", post(handlers::book_appointment))
        .route("/video-calls", get(handlers::get_video_calls))
        .route("/{appointment_id}/payment", post(handlers::record_payment))
        .route("/{appointment_id}/video-room", post(handlers::assign_video_room))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
