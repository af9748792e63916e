// libs/appointment-cell/src/services/cancellation.rs
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::ScheduleStore;
use shared_models::{Appointment, AppointmentStatus, TimeSlot};
use shared_utils::Clock;

use crate::models::{AppointmentError, CancellationAssessment};
use crate::services::lifecycle::AppointmentLifecycle;
use crate::services::notifications::NotificationSink;

const LATE_CANCELLATION_NOTE: &str = "Cancelación tardía confirmada por el cliente";

/// Cancellation with a notice window. Cancelling is always possible for an
/// active appointment; inside the notice window the caller must pass an
/// explicit override, and the record gets a late-cancellation marker.
pub struct CancellationPolicy {
    store: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    config: AppConfig,
}

impl CancellationPolicy {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            config,
        }
    }

    async fn load(&self, id: Uuid) -> Result<(Appointment, TimeSlot), AppointmentError> {
        let appointment = self
            .store
            .appointment_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound("Appointment"))?;
        let slot = self
            .store
            .slot_by_id(appointment.time_slot_id)
            .await?
            .ok_or(AppointmentError::NotFound("Time slot"))?;
        Ok((appointment, slot))
    }

    /// Check an appointment against the notice window without changing it.
    pub async fn assess(&self, id: Uuid) -> Result<CancellationAssessment, AppointmentError> {
        let (appointment, slot) = self.load(id).await?;
        Ok(self.assess_loaded(&appointment, &slot))
    }

    fn assess_loaded(&self, appointment: &Appointment, slot: &TimeSlot) -> CancellationAssessment {
        let minutes_remaining =
            (appointment.scheduled_start(slot.start_time) - self.clock.now()).num_minutes();
        let allowed = !appointment.status.is_terminal();
        CancellationAssessment {
            allowed,
            minutes_remaining,
            requires_late_override: allowed
                && minutes_remaining < self.config.cancellation_notice_minutes,
        }
    }

    /// Cancel an appointment, releasing its capacity. With less than the
    /// configured notice remaining, `late_override_confirmed` must be true or
    /// the call fails with `LateConfirmationRequired`.
    pub async fn cancel(
        &self,
        id: Uuid,
        late_override_confirmed: bool,
    ) -> Result<Appointment, AppointmentError> {
        let (appointment, slot) = self.load(id).await?;
        AppointmentLifecycle::validate_transition(appointment.status, AppointmentStatus::Cancelled)?;

        let assessment = self.assess_loaded(&appointment, &slot);
        if assessment.requires_late_override {
            if !late_override_confirmed {
                return Err(AppointmentError::LateConfirmationRequired {
                    minutes_remaining: assessment.minutes_remaining,
                });
            }
            self.store.append_instructions(id, LATE_CANCELLATION_NOTE).await?;
        }

        let cancelled = self
            .store
            .update_status(id, AppointmentStatus::Cancelled)
            .await?;

        info!(
            appointment_id = %id,
            late = assessment.requires_late_override,
            minutes_remaining = assessment.minutes_remaining,
            "appointment cancelled"
        );

        if let Err(e) = self
            .notifier
            .appointment_cancelled(&cancelled, assessment.requires_late_override)
            .await
        {
            warn!("Cancellation notification failed for {id}: {e:#}");
        }

        Ok(cancelled)
    }
}
