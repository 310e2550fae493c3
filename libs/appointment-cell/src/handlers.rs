// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{
    require_admin, require_doctor_self_or_admin, require_role, require_self_or_staff, AppJson,
};
use shared_utils::AppState;

use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment};
use crate::services::lifecycle::{patient_view, AppointmentLifecycle};
use crate::services::repository::AppointmentRepository;

// ==============================================================================
// REQUEST BODIES
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// ACCESS HELPERS
// ==============================================================================

pub const STAFF: &[Role] = &[Role::Doctor, Role::Admin];

/// Patients see their own rows, doctors the rows assigned to them, admins all.
pub fn ensure_can_view(user: &User, appointment: &Appointment) -> Result<(), AppError> {
    let allowed = user.is_admin()
        || (user.has_role(Role::Patient) && appointment.belongs_to_patient(&user.id))
        || (user.has_role(Role::Doctor) && appointment.belongs_to_doctor(&user.id));

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to access this appointment".to_string()))
    }
}

/// Staff may change anything they can see; patients may only cancel their own.
pub fn ensure_can_modify(user: &User, appointment: &Appointment, update: &AppointmentUpdate) -> Result<(), AppError> {
    ensure_can_view(user, appointment)?;

    if user.has_role(Role::Patient) {
        let cancel_only = AppointmentUpdate::status(AppointmentStatus::Cancelled);
        if *update != cancel_only {
            return Err(AppError::Forbidden("Patients may only cancel their appointments".to_string()));
        }
    }
    Ok(())
}

pub fn shape_for(user: &User, appointment: Appointment) -> Appointment {
    if user.has_role(Role::Patient) {
        patient_view(appointment)
    } else {
        appointment
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

async fn load(repo: &AppointmentRepository, id: &str) -> Result<Appointment, AppError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))
}

async fn modify(
    state: &AppState,
    user: &User,
    id: &str,
    update: AppointmentUpdate,
) -> Result<Appointment, AppError> {
    let repo = AppointmentRepository::new(state);
    let current = load(&repo, id).await?;
    ensure_can_modify(user, &current, &update)?;

    let updated = AppointmentLifecycle::new(state).apply_update(id, update).await?;
    Ok(shape_for(user, updated))
}

// ==============================================================================
// HANDLERS
// ==============================================================================

pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(mut request): AppJson<NewAppointment>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.has_role(Role::Patient) {
        match request.patient_id.as_deref() {
            None => request.patient_id = Some(user.id.clone()),
            Some(patient_id) if patient_id != user.id => {
                return Err(AppError::Forbidden(
                    "Patients may only book for themselves".to_string(),
                ));
            }
            Some(_) => {}
        }
    } else {
        require_admin(&user)?;
    }
    request.validate()?;

    let appointment = AppointmentRepository::new(&state).create(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": shape_for(&user, appointment),
            "message": "Appointment created successfully"
        })),
    ))
}

pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = load(&AppointmentRepository::new(&state), &appointment_id).await?;
    ensure_can_view(&user, &appointment)?;

    Ok(Json(json!({
        "success": true,
        "data": shape_for(&user, appointment)
    })))
}

pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
    AppJson(update): AppJson<AppointmentUpdate>,
) -> Result<Json<Value>, AppError> {
    let appointment = modify(&state, &user, &appointment_id, update).await?;

    Ok(Json(json!({
        "success": true,
        "data": appointment,
        "message": "Appointment updated successfully"
    })))
}

pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let repo = AppointmentRepository::new(&state);
    load(&repo, &appointment_id).await?;
    repo.delete(&appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully"
    })))
}

pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<StatusChangeRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = modify(
        &state,
        &user,
        &appointment_id,
        AppointmentUpdate::status(request.status),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": appointment,
        "message": format!("Appointment status updated to {}", request.status)
    })))
}

pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, STAFF)?;

    let appointment = modify(
        &state,
        &user,
        &appointment_id,
        AppointmentUpdate::status(AppointmentStatus::Completed),
    )
    .await?;
    info!("Appointment {} marked completed by {}", appointment_id, user.id);

    Ok(Json(json!({
        "success": true,
        "data": appointment,
        "message": "Appointment marked as completed"
    })))
}

pub async fn get_patient_appointments(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_self_or_staff(&user, &patient_id)?;

    let mut appointments = AppointmentRepository::new(&state)
        .find_by_patient_id(&patient_id)
        .await?;
    if user.has_role(Role::Doctor) {
        appointments.retain(|a| a.belongs_to_doctor(&user.id));
    }
    let appointments: Vec<Appointment> = appointments
        .into_iter()
        .map(|a| shape_for(&user, a))
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "count": appointments.len()
    })))
}

pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_doctor_self_or_admin(&user, &doctor_id)?;

    let appointments = AppointmentRepository::new(&state)
        .find_by_doctor_id(&doctor_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "count": appointments.len()
    })))
}

pub async fn get_appointments_by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, STAFF)?;
    let date = parse_date(&date)?;

    let mut appointments = AppointmentRepository::new(&state).find_by_date(date).await?;
    if !user.is_admin() {
        appointments.retain(|a| a.belongs_to_doctor(&user.id));
    }

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
    require_role(&user, STAFF)?;

    let mut appointments = AppointmentRepository::new(&state).find_pending().await?;
    if !user.is_admin() {
        appointments.retain(|a| a.belongs_to_doctor(&user.id));
    }

    Ok(Json(json!({
        "success": true,
        "data": appointments,
        "count": appointments.len()
    })))
}

pub async fn get_appointment_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let stats = AppointmentRepository::new(&state).get_statistics().await?;

    Ok(Json(json!({
        "success": true,
        "data": stats
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            email: None,
            role: Some(role.as_str().to_string()),
            name: None,
            created_at: None,
        }
    }

    fn appointment() -> Appointment {
        Appointment::from_row(json!({
            "id": "a-1",
            "patient_id": "p-1",
            "doctor_id": "d-1",
            "appointment_date": "2025-07-27"
        }))
        .unwrap()
    }

    #[test]
    fn viewing_is_scoped_by_role() {
        assert!(ensure_can_view(&user("p-1", Role::Patient), &appointment()).is_ok());
        assert!(ensure_can_view(&user("d-1", Role::Doctor), &appointment()).is_ok());
        assert!(ensure_can_view(&user("x", Role::Admin), &appointment()).is_ok());
        assert_matches!(
            ensure_can_view(&user("p-2", Role::Patient), &appointment()),
            Err(AppError::Forbidden(_))
        );
        assert_matches!(
            ensure_can_view(&user("d-2", Role::Doctor), &appointment()),
            Err(AppError::Forbidden(_))
        );
    }

    #[test]
    fn patients_may_only_cancel() {
        let patient = user("p-1", Role::Patient);
        let cancel = AppointmentUpdate::status(AppointmentStatus::Cancelled);
        assert!(ensure_can_modify(&patient, &appointment(), &cancel).is_ok());

        let confirm = AppointmentUpdate::status(AppointmentStatus::Confirmed);
        assert_matches!(
            ensure_can_modify(&patient, &appointment(), &confirm),
            Err(AppError::Forbidden(_))
        );
        assert!(ensure_can_modify(&user("d-1", Role::Doctor), &appointment(), &confirm).is_ok());
    }

    #[test]
    fn date_parsing() {
        assert!(parse_date("2025-07-27").is_ok());
        assert_matches!(parse_date("27/07/2025"), Err(AppError::BadRequest(_)));
    }
}
