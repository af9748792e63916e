// libs/appointment-cell/src/services/catalog.rs
use std::sync::Arc;
use uuid::Uuid;

use shared_database::ScheduleStore;
use shared_models::TimeSlot;

use crate::models::AppointmentError;

/// Read access to the administrative time-slot catalog. The booking flow
/// never creates or edits slots, it only picks from the active ones.
pub struct SlotCatalogService {
    store: Arc<dyn ScheduleStore>,
}

impl SlotCatalogService {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// Active slots ordered by start time.
    pub async fn list_active_slots(&self) -> Result<Vec<TimeSlot>, AppointmentError> {
        Ok(self.store.active_slots().await?)
    }

    pub async fn get_slot(&self, slot_id: Uuid) -> Result<TimeSlot, AppointmentError> {
        self.store
            .slot_by_id(slot_id)
            .await?
            .ok_or(AppointmentError::NotFound("Time slot"))
    }

    /// Active slot resolved from its 1-based position in the chat menu.
    pub async fn slot_by_menu_choice(
        &self,
        choice: usize,
    ) -> Result<Option<TimeSlot>, AppointmentError> {
        let slots = self.list_active_slots().await?;
        Ok(choice.checked_sub(1).and_then(|idx| slots.get(idx).cloned()))
    }
}
