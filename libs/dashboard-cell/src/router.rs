use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use appointment_cell::handlers::update_appointment_status;
use booking_cell::handlers::get_video_calls;
use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/api/dashboard`.
pub fn dashboard_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/patient/{patient_id}/dashboard", get(handlers::get_patient_dashboard))
        .route("/patient/{patient_id}/appointments", get(handlers::get_patient_appointments))
        .route(
            "/patient/{patient_id}/appointments/{appointment_id}",
            get(handlers::get_patient_appointment),
        )
        .route("/patient/{patient_id}/documents", get(handlers::get_patient_documents))
        .route("/doctor/{doctor_id}/dashboard", get(handlers::get_doctor_dashboard))
        .route("/doctor/{doctor_id}/appointments", get(handlers::get_doctor_appointments))
        .route("/doctor/{doctor_id}/patients", get(handlers::get_doctor_patients))
        .route("/doctor/{doctor_id}/documents", get(handlers::get_doctor_documents))
        .route("/appointment/{appointment_id}/status", put(update_appointment_status))
        .route("/video-appointments", get(get_video_calls))
        .route("/video-rooms/available", get(handlers::get_available_video_rooms))
        .route("/support/ticket", post(handlers::create_support_ticket))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

/// Mounted under `/api/admin` and the legacy `/admin`.
pub fn admin_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/stats", get(handlers::get_admin_stats))
        .route("/appointments", get(handlers::get_all_appointments))
        .route("/appointments/pending", get(handlers::get_pending_appointments))
        .route("/appointments/{appointment_id}", delete(handlers::delete_appointment))
        .route("/doctors/pending", get(handlers::get_pending_doctors))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
