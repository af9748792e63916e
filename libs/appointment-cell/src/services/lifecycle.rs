// libs/appointment-cell/src/services/lifecycle.rs
use shared_models::AppointmentStatus;

use crate::models::AppointmentError;

/// Status state machine for an appointment:
///
/// scheduled -> confirmed | cancelled
/// confirmed -> completed | cancelled
/// completed, cancelled -> (terminal)
pub struct AppointmentLifecycle;

impl AppointmentLifecycle {
    pub fn valid_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
        match from {
            AppointmentStatus::Scheduled => {
                &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
        Self::valid_transitions(from).contains(&to)
    }

    pub fn validate_transition(
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(AppointmentError::InvalidTransition { from, to })
        }
    }
}
