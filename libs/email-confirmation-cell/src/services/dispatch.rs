// libs/email-confirmation-cell/src/services/dispatch.rs
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use appointment_cell::models::Appointment;
use appointment_cell::services::AppointmentRepository;
use auth_cell::services::UserService;
use doctor_cell::services::DoctorService;
use shared_utils::mailer::{MailReceipt, MailTransport};
use shared_utils::AppState;

use crate::models::{ConfirmationError, ConfirmationOutcome, Recipient, Venue};
use crate::services::builder::build_confirmation_email;

/// Lookback window and cap for resends addressed by patient email.
pub const RESEND_WINDOW_DAYS: i64 = 30;
pub const RESEND_LIMIT: usize = 5;

pub struct ConfirmationService {
    appointments: AppointmentRepository,
    users: UserService,
    doctors: DoctorService,
    mailer: Arc<dyn MailTransport>,
    portal_url: String,
}

impl ConfirmationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            appointments: AppointmentRepository::new(state),
            users: UserService::new(state),
            doctors: DoctorService::new(state),
            mailer: state.mailer.clone(),
            portal_url: state.config.video_portal_url.clone(),
        }
    }

    /// Names and address for `appointment`: the row first, then the user and
    /// doctor records. Lookup failures degrade to the defaults.
    pub async fn resolve_recipient(&self, appointment: &Appointment, with_profile: bool) -> Recipient {
        let needs_user = appointment.patient_first_name.is_none() || appointment.patient_email.is_none();
        let patient = match (needs_user, appointment.patient_id.as_deref()) {
            (true, Some(patient_id)) => match self.users.find_by_id(patient_id).await {
                Ok(user) => user,
                Err(e) => {
                    warn!("Patient lookup for appointment {} failed: {}", appointment.id, e);
                    None
                }
            },
            _ => None,
        };

        let needs_doctor = with_profile || appointment.doc_first_name.is_none();
        let doctor = match (needs_doctor, appointment.doctor_id.as_deref()) {
            (true, Some(doctor_id)) => match self.doctors.find_by_id(doctor_id).await {
                Ok(doctor) => doctor,
                Err(e) => {
                    warn!("Doctor lookup for appointment {} failed: {:#}", appointment.id, e);
                    None
                }
            },
            _ => None,
        };

        Recipient {
            patient_name: appointment
                .patient_first_name
                .clone()
                .or_else(|| patient.as_ref().and_then(|p| p.first_name.clone()))
                .unwrap_or_else(|| "Patient".to_string()),
            doctor_name: appointment
                .doc_first_name
                .clone()
                .or_else(|| doctor.as_ref().and_then(|d| d.doctor_name.clone()))
                .unwrap_or_else(|| "Doctor".to_string()),
            patient_email: appointment
                .patient_email
                .clone()
                .or_else(|| patient.as_ref().and_then(|p| p.email.clone())),
            doctor_qualifications: doctor.and_then(|d| d.qualifications),
        }
    }

    /// Sends one confirmation. Called once per appointment; never retried.
    pub async fn send_confirmation(
        &self,
        patient_email: &str,
        recipient: &Recipient,
        appointment: &Appointment,
    ) -> Result<MailReceipt, ConfirmationError> {
        let venue = Venue::for_appointment(appointment, &self.portal_url);
        let message = build_confirmation_email(
            patient_email,
            &recipient.patient_name,
            &recipient.doctor_name,
            appointment,
            &venue,
            self.mailer.sender(),
        );

        debug!("Sending confirmation for appointment {}", appointment.id);
        let receipt = self.mailer.send(&message).await?;
        info!("Confirmation for appointment {} sent to {}", appointment.id, patient_email);
        Ok(receipt)
    }

    /// Resolves and mails one appointment, reporting instead of failing.
    pub async fn confirm(&self, appointment: &Appointment, fallback_email: Option<&str>) -> ConfirmationOutcome {
        let recipient = self.resolve_recipient(appointment, false).await;
        let Some(email) = recipient
            .patient_email
            .clone()
            .or_else(|| fallback_email.map(str::to_string))
        else {
            return ConfirmationOutcome::failed(&appointment.id, ConfirmationError::NoRecipient.to_string());
        };

        match self.send_confirmation(&email, &recipient, appointment).await {
            Ok(_) => ConfirmationOutcome::sent(&appointment.id, &email),
            Err(e) => {
                error!("Confirmation for appointment {} failed: {}", appointment.id, e);
                ConfirmationOutcome::failed(&appointment.id, e.to_string())
            }
        }
    }

    /// One appointment by id, or the most recent bookings under an email.
    pub async fn find_targets(
        &self,
        appointment_id: Option<&str>,
        patient_email: Option<&str>,
    ) -> Result<Vec<Appointment>, ConfirmationError> {
        match (appointment_id, patient_email) {
            (Some(id), _) => Ok(self.appointments.find_by_id(id).await?.into_iter().collect()),
            (None, Some(email)) => {
                let since = Utc::now() - Duration::days(RESEND_WINDOW_DAYS);
                Ok(self
                    .appointments
                    .find_recent_by_email(email, since, RESEND_LIMIT)
                    .await?)
            }
            (None, None) => Err(ConfirmationError::MissingCriteria),
        }
    }

    /// Resends confirmations for every matching appointment. `patient_scope`
    /// restricts matches to one patient's rows. A failed send is reported in
    /// its outcome and does not stop the others.
    pub async fn resend_confirmations(
        &self,
        appointment_id: Option<&str>,
        patient_email: Option<&str>,
        patient_scope: Option<&str>,
    ) -> Result<Vec<ConfirmationOutcome>, ConfirmationError> {
        let mut targets = self.find_targets(appointment_id, patient_email).await?;
        if let Some(patient_id) = patient_scope {
            targets.retain(|a| a.belongs_to_patient(patient_id));
        }
        if targets.is_empty() {
            return Err(ConfirmationError::NoAppointments);
        }

        info!("Resending {} confirmation(s)", targets.len());
        let sends = targets.iter().map(|a| self.confirm(a, patient_email));
        Ok(join_all(sends).await)
    }
}
