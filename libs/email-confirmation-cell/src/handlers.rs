// libs/email-confirmation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use appointment_cell::handlers::{ensure_can_view, shape_for};
use appointment_cell::services::AppointmentRepository;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::AppJson;
use shared_utils::AppState;

use crate::models::SendConfirmationRequest;
use crate::services::ConfirmationService;

/// Resends confirmation mail by appointment id or patient email. Patients
/// only reach their own appointments.
pub async fn send_confirmation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<SendConfirmationRequest>,
) -> Result<Json<Value>, AppError> {
    let scope = user.has_role(Role::Patient).then_some(user.id.as_str());

    let results = ConfirmationService::new(&state)
        .resend_confirmations(request.appointment_id(), request.patient_email(), scope)
        .await?;

    let total = results.len();
    let success_count = results.iter().filter(|r| r.success).count();
    info!("Sent {} of {} confirmation emails", success_count, total);

    Ok(Json(json!({
        "success": success_count > 0,
        "message": format!(
            "Successfully sent {} out of {} confirmation emails",
            success_count, total
        ),
        "results": results,
        "totalAppointments": total,
        "successCount": success_count
    })))
}

/// The appointment with the names and address a confirmation would use.
pub async fn get_confirmation_details(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentRepository::new(&state)
        .find_by_id(&appointment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
    ensure_can_view(&user, &appointment)?;

    let recipient = ConfirmationService::new(&state)
        .resolve_recipient(&appointment, true)
        .await;

    let mut data = serde_json::to_value(shape_for(&user, appointment))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if let Some(fields) = data.as_object_mut() {
        fields.insert("patient_name".into(), json!(recipient.patient_name));
        fields.insert("doctor_name".into(), json!(recipient.doctor_name));
        fields.insert("patient_email".into(), json!(recipient.patient_email));
        fields.insert(
            "doctor_qualifications".into(),
            json!(recipient.doctor_qualifications),
        );
    }

    Ok(Json(json!({
        "success": true,
        "data": data
    })))
}
