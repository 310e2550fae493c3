// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use appointment_cell::handlers::{ensure_can_view, shape_for, STAFF};
use appointment_cell::models::{Appointment, PaymentConfirmation};
use appointment_cell::services::AppointmentRepository;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, require_role, AppJson};
use shared_utils::AppState;

use crate::models::{BookingRequest, VideoCallQuery};
use crate::services::BookingService;

async fn load(state: &AppState, appointment_id: &str) -> Result<Appointment, AppError> {
    AppointmentRepository::new(state)
        .find_by_id(appointment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))
}

pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(mut request): AppJson<BookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if user.has_role(Role::Patient) {
        let booking = &mut request.appointment;
        match booking.patient_id.as_deref() {
            None => booking.patient_id = Some(user.id.clone()),
            Some(patient_id) if patient_id != user.id => {
                return Err(AppError::Forbidden(
                    "Patients may only book for themselves".to_string(),
                ));
            }
            Some(_) => {}
        }
        if booking.patient_email.is_none() {
            booking.patient_email = user.email.clone();
        }
    } else {
        require_admin(&user)?;
    }

    let receipt = BookingService::new(&state)
        .book(request, user.email.as_deref())
        .await?;
    let message = receipt.message("Appointment booked successfully");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": message,
            "data": shape_for(&user, receipt.appointment),
            "confirmation": receipt.confirmation
        })),
    ))
}

/// Patients pay for their own appointments; admins may record any payment.
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
    AppJson(payment): AppJson<PaymentConfirmation>,
) -> Result<Json<Value>, AppError> {
    let appointment = load(&state, &appointment_id).await?;
    if !user.is_admin() && !(user.has_role(Role::Patient) && appointment.belongs_to_patient(&user.id)) {
        return Err(AppError::Forbidden(
            "Not authorized to pay for this appointment".to_string(),
        ));
    }

    let receipt = BookingService::new(&state)
        .record_payment(&appointment_id, payment, user.email.as_deref())
        .await?;
    let message = receipt.message("Payment recorded");

    Ok(Json(json!({
        "success": true,
        "message": message,
        "data": shape_for(&user, receipt.appointment),
        "confirmation": receipt.confirmation
    })))
}

pub async fn assign_video_room(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, STAFF)?;
    let appointment = load(&state, &appointment_id).await?;
    ensure_can_view(&user, &appointment)?;

    let appointment = BookingService::new(&state)
        .reassign_video_room(appointment)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Video room assigned",
        "data": appointment
    })))
}

/// Patients see their own calls, doctors theirs; admins may filter freely.
pub async fn get_video_calls(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<VideoCallQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);

    let appointments = if user.has_role(Role::Patient) {
        service.video_calls(Some(&user.id), None).await?
    } else if user.has_role(Role::Doctor) {
        service
            .video_calls(query.patient_id.as_deref(), Some(&user.id))
            .await?
    } else {
        require_admin(&user)?;
        service
            .video_calls(query.patient_id.as_deref(), query.doctor_id.as_deref())
            .await?
    };

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
