// libs/appointment-cell/src/services/notifications.rs
use async_trait::async_trait;
use tracing::info;

use shared_models::{Appointment, TimeSlot};

/// Outbound delivery seam for booking events. Notification is fire and
/// forget: callers log delivery failures and never let them roll back or
/// fail the operation that triggered them.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn appointment_booked(
        &self,
        appointment: &Appointment,
        slot: &TimeSlot,
    ) -> anyhow::Result<()>;

    async fn appointment_cancelled(
        &self,
        appointment: &Appointment,
        late_cancellation: bool,
    ) -> anyhow::Result<()>;
}

/// Default sink: structured log lines instead of a messaging provider.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn appointment_booked(
        &self,
        appointment: &Appointment,
        slot: &TimeSlot,
    ) -> anyhow::Result<()> {
        info!(
            appointment_id = %appointment.id,
            reference = %appointment.short_id(),
            date = %appointment.appointment_date,
            slot_start = %slot.start_time.format("%H:%M"),
            "appointment booked"
        );
        Ok(())
    }

    async fn appointment_cancelled(
        &self,
        appointment: &Appointment,
        late_cancellation: bool,
    ) -> anyhow::Result<()> {
        info!(
            appointment_id = %appointment.id,
            reference = %appointment.short_id(),
            late_cancellation,
            "appointment cancelled"
        );
        Ok(())
    }
}
