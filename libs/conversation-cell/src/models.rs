// libs/conversation-cell/src/models.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::models::AppointmentError;
use customer_cell::models::CustomerError;
use shared_models::{SampleType, TimeSlot};

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("No active booking session for this customer")]
    NoSession,

    #[error(transparent)]
    Customer(#[from] CustomerError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),
}

/// Where a booking conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Start,
    CollectAddress,
    SelectDate,
    SelectTime,
    SelectSampleType,
    Confirm,
    Modify,
    Booked,
    Aborted,
}

impl BookingStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStep::Booked | BookingStep::Aborted)
    }
}

/// One customer's in-flight booking. Each selection lives in its own typed
/// field; the session carries everything `confirm` needs to place the
/// appointment.
#[derive(Debug, Clone)]
pub struct BookingSession {
    pub customer_id: Uuid,
    pub step: BookingStep,
    pub selected_date: Option<NaiveDate>,
    /// Free slots offered for `selected_date`, in menu order.
    pub candidate_slots: Vec<TimeSlot>,
    pub selected_slot: Option<TimeSlot>,
    pub sample_type: Option<SampleType>,
    pub started_at: NaiveDateTime,
}

impl BookingSession {
    pub fn new(customer_id: Uuid, step: BookingStep, started_at: NaiveDateTime) -> Self {
        Self {
            customer_id,
            step,
            selected_date: None,
            candidate_slots: Vec::new(),
            selected_slot: None,
            sample_type: None,
            started_at,
        }
    }
}

/// What the transport sends back to the customer after one turn.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub prompt: String,
    pub step: BookingStep,
    pub terminal: bool,
}

impl TurnReply {
    pub fn at(step: BookingStep, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            step,
            terminal: step.is_terminal(),
        }
    }
}
