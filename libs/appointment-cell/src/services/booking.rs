// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::ScheduleStore;
use shared_models::{Appointment, AppointmentStatus, NewAppointment};
use shared_utils::Clock;

use crate::models::{AppointmentError, CreateAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycle;
use crate::services::notifications::NotificationSink;

/// Books appointments against the capacity-bounded slot grid and drives
/// status changes through the lifecycle state machine.
pub struct AppointmentBookingService {
    store: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    config: AppConfig,
}

impl AppointmentBookingService {
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

    /// Create a `scheduled` appointment at the flat base price. The capacity
    /// check and the insert run inside the store's critical section, so under
    /// concurrent booking the slot never exceeds its capacity.
    pub async fn create(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let today = self.clock.today();

        if request.appointment_date < today {
            return Err(AppointmentError::Validation(
                "No se pueden agendar citas en fechas pasadas.".to_string(),
            ));
        }
        if request.appointment_date > today + chrono::Duration::days(self.config.max_advance_days) {
            return Err(AppointmentError::Validation(format!(
                "Solo se pueden agendar citas hasta {} días de anticipación.",
                self.config.max_advance_days
            )));
        }

        let slot = self
            .store
            .slot_by_id(request.time_slot_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(AppointmentError::NotFound("Time slot"))?;

        self.store
            .customer_by_id(request.customer_id)
            .await?
            .ok_or(AppointmentError::NotFound("Customer"))?;

        let appointment = self
            .store
            .insert_appointment_checked(
                NewAppointment {
                    customer_id: request.customer_id,
                    appointment_date: request.appointment_date,
                    time_slot_id: request.time_slot_id,
                    sample_type: request.sample_type,
                    special_instructions: request.special_instructions,
                    total_amount_cop: self.config.base_price_cop,
                },
                self.config.slot_capacity,
            )
            .await?;

        info!(
            appointment_id = %appointment.id,
            customer_id = %appointment.customer_id,
            date = %appointment.appointment_date,
            "appointment created"
        );

        if let Err(e) = self.notifier.appointment_booked(&appointment, &slot).await {
            warn!("Booking notification failed for {}: {e:#}", appointment.id);
        }

        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .appointment_by_id(id)
            .await?
            .ok_or(AppointmentError::NotFound("Appointment"))
    }

    /// A customer's appointments, optionally filtered by status, most recent
    /// appointment date first.
    pub async fn customer_appointments(
        &self,
        customer_id: Uuid,
        statuses: Option<&[AppointmentStatus]>,
        limit: Option<usize>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self
            .store
            .appointments_for_customer(customer_id, statuses, limit)
            .await?)
    }

    /// The customer's single active appointment, if any. The conversation
    /// layer uses this as its one-booking-at-a-time gate.
    pub async fn active_appointment(
        &self,
        customer_id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut active = self
            .store
            .appointments_for_customer(
                customer_id,
                Some(&[AppointmentStatus::Scheduled, AppointmentStatus::Confirmed]),
                Some(1),
            )
            .await?;
        Ok(active.pop())
    }

    /// Operational day sheet: non-cancelled appointments in `[from, to]`,
    /// ordered by date then slot start.
    pub async fn appointments_in_range(
        &self,
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.store.appointments_in_range(from, to).await?)
    }

    /// Apply a status change, rejecting anything outside the lifecycle state
    /// machine before it reaches the store.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(id).await?;
        AppointmentLifecycle::validate_transition(current.status, new_status)?;

        let updated = self.store.update_status(id, new_status).await?;
        info!(
            appointment_id = %id,
            from = %current.status,
            to = %new_status,
            "appointment status updated"
        );
        Ok(updated)
    }

    /// Customer confirms attendance: `scheduled` -> `confirmed`.
    pub async fn confirm(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.update_status(id, AppointmentStatus::Confirmed).await
    }

    /// Sample collected: `confirmed` -> `completed`.
    pub async fn complete(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.update_status(id, AppointmentStatus::Completed).await
    }

    /// Record that the physician's order arrived ahead of the visit.
    pub async fn mark_medical_order_received(
        &self,
        id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.get_appointment(id).await?;
        if appointment.status.is_terminal() {
            return Err(AppointmentError::Validation(
                "La cita ya no está activa.".to_string(),
            ));
        }
        Ok(self.store.set_medical_order_received(id).await?)
    }
}
