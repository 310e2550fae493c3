// libs/booking-cell/src/services/booking.rs
//! Booking orchestration: store the appointment, record payment, give
//! video calls their room, then attempt the confirmation mail once.

use tracing::{debug, info, warn};

use appointment_cell::models::{Appointment, AppointmentError, PaymentConfirmation};
use appointment_cell::services::lifecycle::payment_update;
use appointment_cell::services::room::video_room_for;
use appointment_cell::services::{AppointmentLifecycle, AppointmentRepository};
use email_confirmation_cell::ConfirmationService;
use shared_utils::AppState;

use crate::models::{BookingReceipt, BookingRequest};

pub struct BookingService {
    repo: AppointmentRepository,
    lifecycle: AppointmentLifecycle,
    confirmations: ConfirmationService,
    video_base_url: String,
}

impl BookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            repo: AppointmentRepository::new(state),
            lifecycle: AppointmentLifecycle::new(state),
            confirmations: ConfirmationService::new(state),
            video_base_url: state.config.video_call_base_url.clone(),
        }
    }

    /// Creates the appointment and runs payment, room and mail steps.
    /// `fallback_email` is used when neither the row nor the user record has one.
    pub async fn book(
        &self,
        request: BookingRequest,
        fallback_email: Option<&str>,
    ) -> Result<BookingReceipt, AppointmentError> {
        request.appointment.validate()?;

        let mut appointment = self.repo.create(&request.appointment).await?;
        info!(
            "Booked {} appointment {} with doctor {:?}",
            appointment.consultation_type, appointment.id, appointment.doctor_id
        );

        if let Some(payment) = request.payment_details {
            appointment = self.lifecycle.apply_update(&appointment.id, payment_update(payment)).await?;
        }

        let appointment = self.ensure_video_room(appointment).await?;
        let confirmation = self.confirmations.confirm(&appointment, fallback_email).await;

        Ok(BookingReceipt {
            appointment,
            confirmation,
        })
    }

    /// Marks the appointment paid and confirmed, then mails the confirmation.
    pub async fn record_payment(
        &self,
        appointment_id: &str,
        payment: PaymentConfirmation,
        fallback_email: Option<&str>,
    ) -> Result<BookingReceipt, AppointmentError> {
        if payment.amount.is_some_and(|amount| amount < 0.0) {
            return Err(AppointmentError::ValidationError(
                "Payment amount cannot be negative".to_string(),
            ));
        }

        let appointment = self
            .lifecycle
            .apply_update(appointment_id, payment_update(payment))
            .await?;
        info!("Payment recorded for appointment {}", appointment_id);

        let appointment = self.ensure_video_room(appointment).await?;
        let confirmation = self.confirmations.confirm(&appointment, fallback_email).await;

        Ok(BookingReceipt {
            appointment,
            confirmation,
        })
    }

    /// Video calls without a meeting link get their deterministic room.
    /// Other appointments pass through untouched.
    pub async fn ensure_video_room(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        if !appointment.is_video_call() || appointment.video_call_url.is_some() {
            return Ok(appointment);
        }
        self.assign_room(appointment).await
    }

    /// Writes the room for a video-call appointment, replacing any existing one.
    pub async fn reassign_video_room(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        if !appointment.is_video_call() {
            return Err(AppointmentError::ValidationError(
                "Only video-call appointments have video rooms".to_string(),
            ));
        }
        self.assign_room(appointment).await
    }

    async fn assign_room(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let room = video_room_for(&appointment.id, appointment.appointment_date, &self.video_base_url);
        debug!("Room {} for appointment {}", room.room_name, appointment.id);

        match self.repo.assign_video_room(&appointment.id, &room).await? {
            Some(updated) => Ok(updated),
            None => {
                warn!("Appointment {} vanished before its room was written", appointment.id);
                Err(AppointmentError::NotFound)
            }
        }
    }

    pub async fn video_calls(
        &self,
        patient_id: Option<&str>,
        doctor_id: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.repo.find_video_call_appointments(patient_id, doctor_id).await
    }
}
