// libs/email-confirmation-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::models::{Appointment, AppointmentError};
use appointment_cell::services::room::in_person_room;
use shared_models::error::AppError;
use shared_utils::mailer::MailError;

pub const HOSPITAL_NAME: &str = "Gihundwe Hospital";
pub const ONLINE_LOCATION: &str = "Online Meeting";

// ==============================================================================
// VENUE
// ==============================================================================

/// Where the consultation takes place, as shown in the confirmation mail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Venue {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Venue {
    /// In-person rooms are derived from `patient_id + appointment_date`. The link
    /// is the meeting URL only once the appointment is paid, else the portal.
    pub fn for_appointment(appointment: &Appointment, portal_url: &str) -> Self {
        let url = appointment
            .video_call_url
            .clone()
            .filter(|url| appointment.payment_status && !url.is_empty())
            .unwrap_or_else(|| portal_url.to_string());

        if appointment.is_video_call() {
            Self {
                kind: "Video Call".to_string(),
                url,
                location: ONLINE_LOCATION.to_string(),
                room: None,
            }
        } else {
            Self {
                kind: "In-Person Visit".to_string(),
                url,
                location: HOSPITAL_NAME.to_string(),
                room: Some(in_person_room(
                    appointment.patient_id.as_deref(),
                    appointment.appointment_date,
                )),
            }
        }
    }

    pub fn display_location(&self) -> String {
        match &self.room {
            Some(room) => format!("{} - {}", self.location, room),
            None => self.location.clone(),
        }
    }
}

// ==============================================================================
// RECIPIENT + OUTCOMES
// ==============================================================================

/// Names and address resolved for one appointment.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Recipient {
    pub patient_name: String,
    pub doctor_name: String,
    pub patient_email: Option<String>,
    pub doctor_qualifications: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationOutcome {
    pub appointment_id: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_to: Option<String>,
}

impl ConfirmationOutcome {
    pub fn sent(appointment_id: &str, to: &str) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            success: true,
            message: "Confirmation email sent successfully".to_string(),
            sent_to: Some(to.to_string()),
        }
    }

    pub fn failed(appointment_id: &str, message: impl Into<String>) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            success: false,
            message: message.into(),
            sent_to: None,
        }
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendConfirmationRequest {
    #[serde(default, alias = "appointmentId")]
    pub appointment_id: Option<String>,
    #[serde(default, alias = "patientEmail")]
    pub patient_email: Option<String>,
}

impl SendConfirmationRequest {
    fn non_blank(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn appointment_id(&self) -> Option<&str> {
        Self::non_blank(&self.appointment_id)
    }

    pub fn patient_email(&self) -> Option<&str> {
        Self::non_blank(&self.patient_email)
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum ConfirmationError {
    #[error("Either appointment ID or patient email is required")]
    MissingCriteria,

    #[error("No appointments found with the provided criteria")]
    NoAppointments,

    #[error("No email address found for this appointment")]
    NoRecipient,

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error("Failed to send email: {0}")]
    Mail(#[from] MailError),
}

impl From<ConfirmationError> for AppError {
    fn from(err: ConfirmationError) -> Self {
        match err {
            ConfirmationError::MissingCriteria => AppError::BadRequest(err.to_string()),
            ConfirmationError::NoAppointments => AppError::NotFound(err.to_string()),
            ConfirmationError::NoRecipient => AppError::ValidationError(err.to_string()),
            ConfirmationError::Appointment(e) => e.into(),
            ConfirmationError::Mail(e) => AppError::ExternalService(e.to_string()),
        }
    }
}
