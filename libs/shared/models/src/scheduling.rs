// libs/shared/models/src/scheduling.rs
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// PERSISTED RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    /// Canonical digit-only Colombian number, see customer-cell normalization.
    pub phone_number: String,
    pub name: String,
    /// Empty until the first booking collects it.
    pub address: String,
    pub neighborhood: Option<String>,
    pub reference_point: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Customer {
    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub phone_number: String,
    pub name: String,
    pub address: String,
    pub neighborhood: Option<String>,
    pub reference_point: Option<String>,
}

/// Administrative catalog entry. Slots are never created by the booking flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub appointment_date: NaiveDate,
    pub time_slot_id: Uuid,
    pub sample_type: SampleType,
    pub special_instructions: Option<String>,
    pub medical_order_received: bool,
    pub status: AppointmentStatus,
    pub total_amount_cop: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Short uppercase reference shown to customers in chat.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_uppercase()
    }

    /// Scheduled start as a wall-clock datetime, given the slot's start time.
    pub fn scheduled_start(&self, slot_start: NaiveTime) -> NaiveDateTime {
        self.appointment_date.and_time(slot_start)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub customer_id: Uuid,
    pub appointment_date: NaiveDate,
    pub time_slot_id: Uuid,
    pub sample_type: SampleType,
    pub special_instructions: Option<String>,
    pub total_amount_cop: i64,
}

// ==============================================================================
// ENUMERATIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Statuses that hold a place against slot capacity.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Fixed enumeration of samples the home-visit service collects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    SangreVenosa,
    SangreCapilar,
    Orina,
    Deposiciones,
    Esputo,
    Otros,
}

impl SampleType {
    pub const ALL: [SampleType; 6] = [
        SampleType::SangreVenosa,
        SampleType::SangreCapilar,
        SampleType::Orina,
        SampleType::Deposiciones,
        SampleType::Esputo,
        SampleType::Otros,
    ];

    /// Label shown in chat menus and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            SampleType::SangreVenosa => "Sangre venosa",
            SampleType::SangreCapilar => "Sangre capilar",
            SampleType::Orina => "Orina",
            SampleType::Deposiciones => "Deposiciones",
            SampleType::Esputo => "Esputo",
            SampleType::Otros => "Otros",
        }
    }

    /// Menu position is 1-based, matching the numbered chat prompt.
    pub fn from_menu_choice(choice: usize) -> Option<SampleType> {
        choice
            .checked_sub(1)
            .and_then(|idx| SampleType::ALL.get(idx).copied())
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
