use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/doctor`.
pub fn doctor_routes(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/allDoctor", get(handlers::get_all_doctors))
        .route("/allDoctor/{department_id}", get(handlers::get_doctors_by_department))
        .route("/search", get(handlers::search_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor));

    let protected_routes = Router::new()
        .route("/addDoctor", post(handlers::add_doctor))
        .route("/removeDoctor/{doctor_id}", delete(handlers::remove_doctor))
        .route("/docPending", get(handlers::get_pending_doctors))
        .route("/updateDoctorStatus/{doctor_id}", patch(handlers::update_doctor_status))
        .route("/isAvailable/{doctor_id}", patch(handlers::update_availability))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Mounted under `/department`.
pub fn department_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::get_departments))
        .route("/{department_id}", get(handlers::get_department))
        .with_state(state)
}
