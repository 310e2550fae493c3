// libs/dashboard-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use appointment_cell::handlers::{parse_date, shape_for};
use appointment_cell::models::{Appointment, AppointmentStatus};
use appointment_cell::services::AppointmentRepository;
use auth_cell::services::UserService;
use doctor_cell::services::DoctorService;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, require_doctor_self_or_admin, require_self_or_staff};
use shared_utils::AppState;

use crate::models::{
    AdminStats, DoctorAppointmentsQuery, Page, PatientAppointmentsQuery, StatusFilter,
    VideoRoomQuery,
};
use crate::services::{doctor_dashboard, doctor_patients, filter_patient_appointments, patient_dashboard};

/// A patient's rows as the caller may see them: doctors only get their own.
async fn patient_rows(state: &AppState, user: &User, patient_id: &str) -> Result<Vec<Appointment>, AppError> {
    require_self_or_staff(user, patient_id)?;

    let mut appointments = AppointmentRepository::new(state)
        .find_by_patient_id(patient_id)
        .await?;
    if user.has_role(Role::Doctor) {
        appointments.retain(|a| a.belongs_to_doctor(&user.id));
    }
    Ok(appointments)
}

// ==============================================================================
// PATIENT DASHBOARD
// ==============================================================================

pub async fn get_patient_dashboard(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = patient_rows(&state, &user, &patient_id).await?;
    let cards = patient_dashboard(&appointments, Utc::now().date_naive());

    Ok(Json(json!({
        "success": true,
        "data": cards
    })))
}

pub async fn get_patient_appointments(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = query
        .status
        .as_deref()
        .map(str::parse::<StatusFilter>)
        .transpose()?
        .unwrap_or_default();

    let appointments = patient_rows(&state, &user, &patient_id).await?;
    let appointments: Vec<Appointment> = filter_patient_appointments(appointments, filter, query.limit)
        .into_iter()
        .map(|a| shape_for(&user, a))
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "count": appointments.len()
    })))
}

pub async fn get_patient_appointment(
    State(state): State<Arc<AppState>>,
    Path((patient_id, appointment_id)): Path<(String, String)>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_self_or_staff(&user, &patient_id)?;

    let appointment = AppointmentRepository::new(&state)
        .find_by_id(&appointment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    let doctor_mismatch = user.has_role(Role::Doctor) && !appointment.belongs_to_doctor(&user.id);
    if !appointment.belongs_to_patient(&patient_id) || doctor_mismatch {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "data": shape_for(&user, appointment)
    })))
}

pub async fn get_patient_documents(
    Path(patient_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_self_or_staff(&user, &patient_id)?;

    Ok(Json(json!({
        "success": true,
        "data": [],
        "message": "Document storage is not available yet"
    })))
}

// ==============================================================================
// DOCTOR DASHBOARD
// ==============================================================================

pub async fn get_doctor_dashboard(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor_self_or_admin(&user, &doctor_id)?;

    let appointments = AppointmentRepository::new(&state)
        .find_by_doctor_id(&doctor_id)
        .await?;
    let cards = doctor_dashboard(&appointments, Utc::now().date_naive());

    Ok(Json(json!({
        "success": true,
        "data": cards
    })))
}

pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
    Query(query): Query<DoctorAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    require_doctor_self_or_admin(&user, &doctor_id)?;

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<AppointmentStatus>)
        .transpose()?;
    let page = Page::new(query.page, query.limit);
    debug!("Doctor {} appointments page {:?}", doctor_id, page);

    let appointments = AppointmentRepository::new(&state)
        .find_by_doctor_page(&doctor_id, status, page.offset(), page.limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "count": appointments.len()
        }
    })))
}

pub async fn get_doctor_patients(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor_self_or_admin(&user, &doctor_id)?;

    let appointments = AppointmentRepository::new(&state)
        .find_by_doctor_id(&doctor_id)
        .await?;
    let patients = doctor_patients(&appointments);

    Ok(Json(json!({
        "success": true,
        "data": patients,
        "count": patients.len()
    })))
}

pub async fn get_doctor_documents(
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor_self_or_admin(&user, &doctor_id)?;

    Ok(Json(json!({
        "success": true,
        "data": [],
        "message": "Document storage is not available yet"
    })))
}

// ==============================================================================
// SHARED
// ==============================================================================

pub async fn get_available_video_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoRoomQuery>,
) -> Result<Json<Value>, AppError> {
    let (Some(date), Some(time)) = (
        query.date.as_deref().filter(|d| !d.is_empty()),
        query.time.as_deref().filter(|t| !t.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Date and time parameters are required".to_string(),
        ));
    };
    let date = parse_date(date)?;

    let rooms = AppointmentRepository::new(&state)
        .get_available_video_rooms(date, time)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": rooms,
        "count": rooms.len()
    })))
}

pub async fn create_support_ticket() -> Result<Json<Value>, AppError> {
    Err(AppError::NotImplemented(
        "Support tickets are not available yet".to_string(),
    ))
}

// ==============================================================================
// ADMIN
// ==============================================================================

pub async fn get_admin_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let appointments = AppointmentRepository::new(&state).get_statistics().await?;
    let pending_doctors = DoctorService::new(&state).list_pending().await?.len();
    let registered_users = UserService::new(&state).list_all().await?.len();

    Ok(Json(json!({
        "success": true,
        "data": AdminStats {
            appointments,
            pending_doctors,
            registered_users,
        }
    })))
}

pub async fn get_all_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let appointments = AppointmentRepository::new(&state).find_all().await?;

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "count": appointments.len()
    })))
}

pub async fn get_pending_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let appointments = AppointmentRepository::new(&state).find_pending().await?;

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "count": appointments.len()
    })))
}

pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let repo = AppointmentRepository::new(&state);
    repo.find_by_id(&appointment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
    repo.delete(&appointment_id).await?;
    info!("Admin {} deleted appointment {}", user.id, appointment_id);

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully"
    })))
}

pub async fn get_pending_doctors(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctors = DoctorService::new(&state).list_pending().await?;

    Ok(Json(json!({
        "success": true,
        "data": doctors,
        "count": doctors.len()
    })))
}
