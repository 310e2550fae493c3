use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::error;

use appointment_cell::router::appointment_routes;
use auth_cell::{auth_routes, user_routes};
use booking_cell::booking_routes;
use dashboard_cell::{admin_routes, dashboard_routes};
use doctor_cell::{department_routes, doctor_routes};
use email_confirmation_cell::email_confirmation_routes;
use shared_utils::AppState;

async fn database_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state
        .supabase
        .request::<Value>(Method::GET, "/rest/v1/users?select=id&limit=1", None)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "Connected to Supabase" })),
        ),
        Err(e) => {
            error!("Database health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "Database connection failed" })),
            )
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let health = Router::new()
        .route("/api/health", get(database_health))
        .with_state(state.clone());

    Router::new()
        .route("/", get(|| async { "iTABAZA API is running!" }))
        .merge(health)
        .nest("/auth", auth_routes(state.clone()))
        .nest("/user", user_routes(state.clone()))
        .nest("/doctor", doctor_routes(state.clone()))
        .nest("/department", department_routes(state.clone()))
        .nest("/appointment", appointment_routes(state.clone()))
        .nest("/enhanced-appointment", booking_routes(state.clone()))
        .nest("/email-confirmation", email_confirmation_routes(state.clone()))
        .nest("/api/dashboard", dashboard_routes(state.clone()))
        .nest("/api/admin", admin_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}
