// libs/shared/database/src/memory.rs
use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use shared_models::{Appointment, AppointmentStatus, Customer, NewAppointment, NewCustomer, TimeSlot};

use crate::store::{ScheduleStore, StoreError};

/// Reference backend used by the demo binary and the test suites. All three
/// tables live behind one async mutex, so the capacity check and the insert
/// of `insert_appointment_checked` form a single critical section, so writers
/// racing for the same (date, slot) pair are serialized. A SQL backend must
/// provide the same guarantee with a row-scoped lock or conditional insert.
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    customers: HashMap<Uuid, Customer>,
    time_slots: HashMap<Uuid, TimeSlot>,
    appointments: HashMap<Uuid, Appointment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Tables::default()) }
    }

    /// Seed a catalog slot. Catalog rows are administrative data; the booking
    /// flow never creates them.
    pub async fn seed_slot(&self, start_time: NaiveTime, end_time: NaiveTime) -> TimeSlot {
        let slot = TimeSlot {
            id: Uuid::new_v4(),
            start_time,
            end_time,
            is_active: true,
            created_at: wall_now(),
        };
        let mut tables = self.inner.lock().await;
        tables.time_slots.insert(slot.id, slot.clone());
        slot
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn wall_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer, StoreError> {
        let mut tables = self.inner.lock().await;

        // Uniqueness backstop against concurrent first-contacts.
        if tables.customers.values().any(|c| c.phone_number == new.phone_number) {
            return Err(StoreError::DuplicatePhone(new.phone_number));
        }

        let now = wall_now();
        let customer = Customer {
            id: Uuid::new_v4(),
            phone_number: new.phone_number,
            name: new.name,
            address: new.address,
            neighborhood: new.neighborhood,
            reference_point: new.reference_point,
            created_at: now,
            updated_at: now,
        };
        tables.customers.insert(customer.id, customer.clone());
        debug!("Customer {} inserted", customer.id);
        Ok(customer)
    }

    async fn customer_by_id(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(self.inner.lock().await.customers.get(&id).cloned())
    }

    async fn customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, StoreError> {
        let tables = self.inner.lock().await;
        Ok(tables.customers.values().find(|c| c.phone_number == phone).cloned())
    }

    async fn update_customer_address(
        &self,
        id: Uuid,
        address: String,
        neighborhood: Option<String>,
    ) -> Result<Customer, StoreError> {
        let mut tables = self.inner.lock().await;
        let customer = tables.customers.get_mut(&id).ok_or(StoreError::NotFound("customer"))?;
        customer.address = address;
        if neighborhood.is_some() {
            customer.neighborhood = neighborhood;
        }
        customer.updated_at = wall_now();
        Ok(customer.clone())
    }

    async fn active_slots(&self) -> Result<Vec<TimeSlot>, StoreError> {
        let tables = self.inner.lock().await;
        let mut slots: Vec<TimeSlot> =
            tables.time_slots.values().filter(|s| s.is_active).cloned().collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn slot_by_id(&self, id: Uuid) -> Result<Option<TimeSlot>, StoreError> {
        Ok(self.inner.lock().await.time_slots.get(&id).cloned())
    }

    async fn insert_appointment_checked(
        &self,
        new: NewAppointment,
        capacity: u32,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.lock().await;

        if !tables.time_slots.contains_key(&new.time_slot_id) {
            return Err(StoreError::NotFound("time slot"));
        }

        let booked = tables
            .appointments
            .values()
            .filter(|a| {
                a.appointment_date == new.appointment_date
                    && a.time_slot_id == new.time_slot_id
                    && a.status.is_active()
            })
            .count() as u32;

        if booked >= capacity {
            return Err(StoreError::SlotFull { date: new.appointment_date });
        }

        let now = wall_now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            appointment_date: new.appointment_date,
            time_slot_id: new.time_slot_id,
            sample_type: new.sample_type,
            special_instructions: new.special_instructions,
            medical_order_received: false,
            status: AppointmentStatus::Scheduled,
            total_amount_cop: new.total_amount_cop,
            created_at: now,
            updated_at: now,
        };
        tables.appointments.insert(appointment.id, appointment.clone());
        debug!("Appointment {} inserted ({} of {})", appointment.id, booked + 1, capacity);
        Ok(appointment)
    }

    async fn count_active(&self, date: NaiveDate, slot_id: Uuid) -> Result<u32, StoreError> {
        let tables = self.inner.lock().await;
        let count = tables
            .appointments
            .values()
            .filter(|a| a.appointment_date == date && a.time_slot_id == slot_id && a.status.is_active())
            .count();
        Ok(count as u32)
    }

    async fn appointment_by_id(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.inner.lock().await.appointments.get(&id).cloned())
    }

    async fn appointments_for_customer(
        &self,
        customer_id: Uuid,
        statuses: Option<&[AppointmentStatus]>,
        limit: Option<usize>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.inner.lock().await;
        let mut matches: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.customer_id == customer_id)
            .filter(|a| statuses.map_or(true, |wanted| wanted.contains(&a.status)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.appointment_date
                .cmp(&a.appointment_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn appointments_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.inner.lock().await;
        let mut matches: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| {
                a.appointment_date >= from
                    && a.appointment_date <= to
                    && a.status != AppointmentStatus::Cancelled
            })
            .cloned()
            .collect();
        let slot_start = |slot_id: &Uuid| tables.time_slots.get(slot_id).map(|s| s.start_time);
        matches.sort_by(|a, b| {
            a.appointment_date
                .cmp(&b.appointment_date)
                .then(slot_start(&a.time_slot_id).cmp(&slot_start(&b.time_slot_id)))
        });
        Ok(matches)
    }

    async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.lock().await;
        let appointment = tables.appointments.get_mut(&id).ok_or(StoreError::NotFound("appointment"))?;
        appointment.status = status;
        appointment.updated_at = wall_now();
        Ok(appointment.clone())
    }

    async fn set_medical_order_received(&self, id: Uuid) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.lock().await;
        let appointment = tables.appointments.get_mut(&id).ok_or(StoreError::NotFound("appointment"))?;
        appointment.medical_order_received = true;
        appointment.updated_at = wall_now();
        Ok(appointment.clone())
    }

    async fn append_instructions(&self, id: Uuid, note: &str) -> Result<Appointment, StoreError> {
        let mut tables = self.inner.lock().await;
        let appointment = tables.appointments.get_mut(&id).ok_or(StoreError::NotFound("appointment"))?;
        appointment.special_instructions = match appointment.special_instructions.take() {
            Some(existing) => Some(format!("{existing}\n{note}")),
            None => Some(note.to_string()),
        };
        appointment.updated_at = wall_now();
        Ok(appointment.clone())
    }
}
