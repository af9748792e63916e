// libs/customer-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;

#[derive(Error, Debug)]
pub enum CustomerError {
    #[error("{0}")]
    Validation(String),

    #[error("Lo sentimos, solo atendemos en el perímetro urbano de Buga. Esta dirección parece estar fuera de nuestra área de servicio.")]
    OutOfServiceArea,

    #[error("Por favor proporciona una dirección más específica dentro del perímetro urbano de Buga (incluye barrio, carrera/calle y número).")]
    AddressTooVague,

    #[error("Customer not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] StoreError),
}

/// Derived view over a customer's appointment history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerStats {
    pub total_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub pending_appointments: usize,
    pub last_appointment_date: Option<NaiveDate>,
    /// Three or more completed visits.
    pub is_frequent_customer: bool,
}
