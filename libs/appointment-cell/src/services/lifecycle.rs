// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use shared_utils::AppState;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentUpdate, PaymentConfirmation,
    VideoRoom,
};
use crate::services::repository::AppointmentRepository;

impl AppointmentStatus {
    /// Next statuses reachable under the strict transition table.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    /// Same-status updates always pass.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        *self == next || self.valid_transitions().contains(&next)
    }
}

pub fn check_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
    strict: bool,
) -> Result<(), AppointmentError> {
    if !strict || current.can_transition_to(next) {
        return Ok(());
    }

    warn!("Rejected status transition {} -> {}", current, next);
    Err(AppointmentError::InvalidStatusTransition {
        from: current,
        to: next,
    })
}

/// Patient-facing copy: the meeting link stays hidden until payment is recorded.
pub fn patient_view(mut appointment: Appointment) -> Appointment {
    if appointment.is_video_call() && !appointment.payment_status {
        appointment.video_call_url = None;
    }
    appointment
}

pub fn payment_update(payment: PaymentConfirmation) -> AppointmentUpdate {
    AppointmentUpdate {
        status: Some(AppointmentStatus::Confirmed),
        payment_status: Some(true),
        payment_transaction_id: payment.transaction_id,
        payment_amount: payment.amount,
        payment_currency: payment.currency,
        payment_method: payment.method,
        ..AppointmentUpdate::default()
    }
}

pub fn video_room_update(room: VideoRoom) -> AppointmentUpdate {
    AppointmentUpdate {
        video_call_room_id: Some(room.room_id),
        video_call_room_name: Some(room.room_name),
        video_call_url: Some(room.url),
        ..AppointmentUpdate::default()
    }
}

/// Status and partial updates that respect the configured transition policy.
pub struct AppointmentLifecycle {
    repo: AppointmentRepository,
    strict: bool,
}

impl AppointmentLifecycle {
    pub fn new(state: &AppState) -> Self {
        Self {
            repo: AppointmentRepository::new(state),
            strict: state.config.strict_status_transitions,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub async fn update_status(
        &self,
        appointment_id: &str,
        next: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        self.apply_update(appointment_id, AppointmentUpdate::status(next)).await
    }

    /// Applies `update` after checking any status change against the policy.
    /// Only strict mode needs the current row, so permissive updates are a
    /// single round trip.
    pub async fn apply_update(
        &self,
        appointment_id: &str,
        update: AppointmentUpdate,
    ) -> Result<Appointment, AppointmentError> {
        if update.is_empty() {
            return Err(AppointmentError::ValidationError(
                "No updatable fields supplied".to_string(),
            ));
        }

        if let (Some(next), true) = (update.status, self.strict) {
            let current = self
                .repo
                .find_by_id(appointment_id)
                .await?
                .ok_or(AppointmentError::NotFound)?;
            check_transition(current.status, next, self.strict)?;
        }

        debug!("Updating appointment {}", appointment_id);
        let updated = self
            .repo
            .update(appointment_id, &update)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if let Some(status) = update.status {
            info!("Appointment {} is now {}", appointment_id, status);
        }
        Ok(updated)
    }
}
