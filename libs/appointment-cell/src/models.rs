// libs/appointment-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::{AppointmentStatus, SampleType, TimeSlot};

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Time slot is fully booked for {date}")]
    SlotFull { date: NaiveDate },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Cancellation inside the notice window requires explicit confirmation ({minutes_remaining} minutes remain)")]
    LateConfirmationRequired { minutes_remaining: i64 },

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for AppointmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AppointmentError::NotFound(what),
            StoreError::SlotFull { date } => AppointmentError::SlotFull { date },
            other => AppointmentError::Database(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub customer_id: Uuid,
    pub appointment_date: NaiveDate,
    pub time_slot_id: Uuid,
    pub sample_type: SampleType,
    pub special_instructions: Option<String>,
}

/// One (date, slot) cell of the availability grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub available: bool,
    pub booked_count: u32,
}

/// Per-day capacity digest used by operational summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayCapacity {
    pub date: NaiveDate,
    pub total_slots: usize,
    pub available_slots: usize,
    pub booked_slots: usize,
    pub capacity_percentage: u32,
    pub is_full: bool,
}

/// Outcome of the cancellation-notice check. The policy never blocks a
/// cancellation outright; inside the notice window it demands a second
/// confirmation instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationAssessment {
    pub allowed: bool,
    pub minutes_remaining: i64,
    pub requires_late_override: bool,
}
