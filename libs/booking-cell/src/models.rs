// libs/booking-cell/src/models.rs
use serde::{Deserialize, Serialize};

use appointment_cell::models::{Appointment, NewAppointment, PaymentConfirmation};
use email_confirmation_cell::ConfirmationOutcome;

/// Booking form: the appointment plus an optional payment made at booking time.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    #[serde(flatten)]
    pub appointment: NewAppointment,
    #[serde(default, alias = "paymentDetails")]
    pub payment_details: Option<PaymentConfirmation>,
}

/// Result of a booking or payment: the stored row and what happened to its mail.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub appointment: Appointment,
    pub confirmation: ConfirmationOutcome,
}

impl BookingReceipt {
    pub fn message(&self, done: &str) -> String {
        if self.confirmation.success {
            format!("{}. Check your email for the confirmation.", done)
        } else {
            format!("{}, but the confirmation email could not be sent.", done)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoCallQuery {
    #[serde(default, alias = "patientId")]
    pub patient_id: Option<String>,
    #[serde(default, alias = "doctorId")]
    pub doctor_id: Option<String>,
}
