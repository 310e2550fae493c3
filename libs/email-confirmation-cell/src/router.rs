use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/email-confirmation`.
pub fn email_confirmation_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/send-confirmation", post(handlers::send_confirmation))
        .route("/appointment/{appointment_id}", get(handlers::get_confirmation_details))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
