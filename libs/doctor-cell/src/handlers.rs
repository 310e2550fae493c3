use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, require_doctor_self_or_admin, AppJson};
use shared_utils::AppState;

use crate::models::{AvailabilityRequest, DoctorStatusRequest, NewDoctorRequest, SearchQuery};
use crate::services::{DepartmentService, DoctorService};

fn doctor_not_found() -> AppError {
    AppError::NotFound("Doctor not found".to_string())
}

// ==============================================================================
// PUBLIC DOCTOR LOOKUPS
// ==============================================================================

pub async fn get_all_doctors(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state).list_approved().await?;

    Ok(Json(json!({
        "success": true,
        "data": doctors,
        "count": doctors.len()
    })))
}

pub async fn get_doctors_by_department(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state)
        .list_by_department(department_id)
        .await?;

    let message = doctors
        .is_empty()
        .then_some("This Department have no doctors");

    Ok(Json(json!({
        "success": true,
        "data": doctors,
        "count": doctors.len(),
        "message": message
    })))
}

pub async fn search_doctors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let term = query.q.unwrap_or_default();
    if term.trim().is_empty() {
        return Err(AppError::BadRequest("Query parameter 'q' is required".to_string()));
    }

    let doctors = DoctorService::new(&state).search_by_name(&term).await?;

    Ok(Json(json!({
        "success": true,
        "data": doctors,
        "count": doctors.len()
    })))
}

pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state)
        .find_by_id(&doctor_id)
        .await?
        .ok_or_else(doctor_not_found)?;

    Ok(Json(json!({
        "success": true,
        "data": doctor
    })))
}

// ==============================================================================
// ADMIN MANAGEMENT
// ==============================================================================

pub async fn add_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<NewDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;
    request.validate().map_err(AppError::ValidationError)?;

    let doctor = DoctorService::new(&state).create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Doctor has been created",
            "data": doctor
        })),
    ))
}

pub async fn remove_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = DoctorService::new(&state);
    service.find_by_id(&doctor_id).await?.ok_or_else(doctor_not_found)?;
    service.delete(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted"
    })))
}

pub async fn get_pending_doctors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctors = DoctorService::new(&state).list_pending().await?;
    let message = if doctors.is_empty() {
        "No doctors pending approval"
    } else {
        "Doctors pending approval"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "data": doctors,
        "count": doctors.len()
    })))
}

/// `true` approves the application; `false` rejects it by deleting the row.
pub async fn update_doctor_status(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<DoctorStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = DoctorService::new(&state);
    service.find_by_id(&doctor_id).await?.ok_or_else(doctor_not_found)?;

    if request.status {
        let doctor = service.approve(&doctor_id).await?.ok_or_else(doctor_not_found)?;
        Ok(Json(json!({
            "success": true,
            "message": "Doctor Application Approved",
            "data": doctor
        })))
    } else {
        service.delete(&doctor_id).await?;
        info!("Doctor application {} rejected", doctor_id);
        Ok(Json(json!({
            "success": true,
            "message": "Doctor Application Rejected"
        })))
    }
}

pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<AvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor_self_or_admin(&user, &doctor_id)?;

    let doctor = DoctorService::new(&state)
        .set_availability(&doctor_id, request.is_available)
        .await?
        .ok_or_else(doctor_not_found)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor's status has been updated",
        "data": doctor
    })))
}

// ==============================================================================
// DEPARTMENTS
// ==============================================================================

pub async fn get_departments(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let departments = DepartmentService::new(&state).list().await?;

    Ok(Json(json!({
        "success": true,
        "data": departments,
        "count": departments.len()
    })))
}

pub async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(department_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let department = DepartmentService::new(&state)
        .find_by_id(department_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": department
    })))
}
