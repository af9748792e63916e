// libs/shared/database/src/store.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_models::{Appointment, AppointmentStatus, Customer, NewAppointment, NewCustomer, TimeSlot};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Time slot is fully booked for {date}")]
    SlotFull { date: NaiveDate },

    #[error("A customer with phone {0} already exists")]
    DuplicatePhone(String),

    #[error("Datastore unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for the scheduling core. Any relational backend works
/// as long as `insert_appointment_checked` runs its capacity count and the
/// insert in one transactional scope; `MemoryStore` is the in-crate reference
/// implementation.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    // --- customers ---
    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError>;
    async fn customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;
    async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, StoreError>;
    async fn update_customer_address(
        &self,
        id: Uuid,
        address: String,
        neighborhood: Option<String>,
    ) -> Result<Customer, StoreError>;

    // --- time slot catalog ---
    /// Active slots ordered by start time.
    async fn active_slots(&self) -> Result<Vec<TimeSlot>, StoreError>;
    async fn slot_by_id(&self, id: Uuid) -> Result<Option<TimeSlot>, StoreError>;

    // --- appointments ---
    /// Count-then-insert under one critical section: inserts with status
    /// `scheduled` only while the active count for (date, slot) stays below
    /// `capacity`, otherwise fails with `SlotFull` and inserts nothing.
    async fn insert_appointment_checked(
        &self,
        new: NewAppointment,
        capacity: u32,
    ) -> Result<Appointment, StoreError>;

    /// Appointments holding capacity (scheduled or confirmed) for a pair.
    async fn count_active(&self, date: NaiveDate, slot_id: Uuid) -> Result<u32, StoreError>;

    async fn appointment_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// A customer's appointments, most recent appointment date first.
    async fn appointments_for_customer(
        &self,
        customer_id: Uuid,
        statuses: Option<&[AppointmentStatus]>,
        limit: Option<usize>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Non-cancelled appointments in `[from, to]`, ordered by date then slot.
    async fn appointments_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment, StoreError>;

    /// Flag that the physician's order arrived for this appointment.
    async fn set_medical_order_received(&self, id: Uuid) -> Result<Appointment, StoreError>;

    /// Append a line to the record's special instructions (late-cancellation
    /// markers and similar annotations).
    async fn append_instructions(&self, id: Uuid, note: &str) -> Result<Appointment, StoreError>;
}
