// libs/customer-cell/src/services/directory.rs
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{ScheduleStore, StoreError};
use shared_models::{AppointmentStatus, Customer, NewCustomer};

use crate::models::{CustomerError, CustomerStats};

/// Markers that place an address outside the home-visit perimeter: rural
/// designations and neighboring municipalities.
const EXCLUDED_AREA_TERMS: [&str; 12] = [
    "corregimiento",
    "vereda",
    "finca",
    "hacienda",
    "rural",
    "campo",
    "tulúa",
    "san pedro",
    "ginebra",
    "el cerrito",
    "guacarí",
    "yotoco",
];

/// Tokens an in-perimeter urban address is expected to contain.
const URBAN_INDICATORS: [&str; 14] = [
    "buga",
    "guadalajara de buga",
    "centro",
    "centro histórico",
    "barrio",
    "carrera",
    "calle",
    "avenida",
    "av.",
    "cr.",
    "cl.",
    "manzana",
    "casa",
    "edificio",
];

const DEFAULT_DISPLAY_NAME: &str = "Cliente WhatsApp";

/// Identity and address records keyed by normalized phone number. Area
/// validation is a deliberate keyword heuristic: conservative text matching
/// instead of geocoding, so ambiguous input is rejected.
pub struct CustomerDirectoryService {
    store: Arc<dyn ScheduleStore>,
}

impl CustomerDirectoryService {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    /// Canonical digit-only form: strip formatting, drop the `57` country
    /// code, and complete 7-digit landlines with the Valle del Cauca area
    /// code `2`.
    pub fn normalize_phone(phone: &str) -> String {
        let mut digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() == 12 && digits.starts_with("57") {
            digits = digits.split_off(2);
        }
        if digits.len() == 7 {
            digits.insert(0, '2');
        }
        digits
    }

    /// Colombian numbers the service accepts: 10-digit mobiles (`3…`),
    /// numbers with country code (`573…`), and local or area-coded landlines.
    pub fn is_valid_colombian_phone(phone: &str) -> bool {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.len() {
            10 => digits.starts_with('3') || digits.starts_with('2'),
            12 => digits.starts_with("573"),
            7 => true,
            _ => false,
        }
    }

    /// Display form for chat: `3XX XXX XXXX` for mobiles, `(X) XXX XXXX`
    /// for landlines.
    pub fn format_phone(phone: &str) -> String {
        let digits = Self::normalize_phone(phone);
        if digits.len() != 10 {
            return phone.to_string();
        }
        if digits.starts_with('3') {
            format!("{} {} {}", &digits[..3], &digits[3..6], &digits[6..])
        } else {
            format!("({}) {} {}", &digits[..1], &digits[1..4], &digits[4..])
        }
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, CustomerError> {
        let normalized = Self::normalize_phone(phone);
        Ok(self.store.customer_by_phone(&normalized).await?)
    }

    pub async fn find_by_id(&self, customer_id: Uuid) -> Result<Customer, CustomerError> {
        self.store
            .customer_by_id(customer_id)
            .await?
            .ok_or(CustomerError::NotFound)
    }

    /// Idempotent first-contact registration. The address stays empty until
    /// the booking flow collects it; the store's phone uniqueness constraint
    /// backstops concurrent first-contacts.
    pub async fn find_or_create(
        &self,
        phone: &str,
        display_name: Option<&str>,
    ) -> Result<Customer, CustomerError> {
        if !Self::is_valid_colombian_phone(phone) {
            return Err(CustomerError::Validation(
                "Número de teléfono inválido. Debe ser un número colombiano válido.".to_string(),
            ));
        }

        let normalized = Self::normalize_phone(phone);

        if let Some(existing) = self.store.customer_by_phone(&normalized).await? {
            debug!("Customer {} found for phone {}", existing.id, normalized);
            return Ok(existing);
        }

        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string();

        let created = self
            .store
            .insert_customer(NewCustomer {
                phone_number: normalized.clone(),
                name,
                address: String::new(),
                neighborhood: None,
                reference_point: None,
            })
            .await;

        match created {
            Ok(customer) => {
                info!("Customer {} registered from first contact", customer.id);
                Ok(customer)
            }
            // Lost a first-contact race: the row exists now, return it.
            Err(StoreError::DuplicatePhone(_)) => {
                warn!("Concurrent registration for phone {}, re-reading", normalized);
                self.store
                    .customer_by_phone(&normalized)
                    .await?
                    .ok_or(CustomerError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store a validated home-visit address on the customer record.
    pub async fn update_address(
        &self,
        customer_id: Uuid,
        address: &str,
    ) -> Result<Customer, CustomerError> {
        Self::validate_service_area(address)?;
        let updated = self
            .store
            .update_customer_address(customer_id, address.trim().to_string(), None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => CustomerError::NotFound,
                other => CustomerError::Database(other),
            })?;
        info!("Address updated for customer {}", customer_id);
        Ok(updated)
    }

    /// Heuristic perimeter check: reject known out-of-area terms, then demand
    /// at least one urban indicator and three address components.
    pub fn validate_service_area(address: &str) -> Result<(), CustomerError> {
        let normalized = address.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(CustomerError::Validation(
                "La dirección es requerida para el servicio a domicilio.".to_string(),
            ));
        }

        if EXCLUDED_AREA_TERMS.iter().any(|term| normalized.contains(term)) {
            return Err(CustomerError::OutOfServiceArea);
        }

        if !URBAN_INDICATORS.iter().any(|ind| normalized.contains(ind)) {
            return Err(CustomerError::AddressTooVague);
        }

        let components = normalized
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .count();
        if components < 3 {
            return Err(CustomerError::AddressTooVague);
        }

        Ok(())
    }

    /// Single-active-booking gate: true while a scheduled or confirmed
    /// appointment exists.
    pub async fn has_active_appointment(&self, customer_id: Uuid) -> Result<bool, CustomerError> {
        let active = self
            .store
            .appointments_for_customer(
                customer_id,
                Some(&[AppointmentStatus::Scheduled, AppointmentStatus::Confirmed]),
                Some(1),
            )
            .await?;
        Ok(!active.is_empty())
    }

    pub async fn get_stats(&self, customer_id: Uuid) -> Result<CustomerStats, CustomerError> {
        let history = self
            .store
            .appointments_for_customer(customer_id, None, Some(100))
            .await?;

        let completed = history
            .iter()
            .filter(|a| a.status == AppointmentStatus::Completed)
            .count();
        let cancelled = history
            .iter()
            .filter(|a| a.status == AppointmentStatus::Cancelled)
            .count();
        let pending = history.iter().filter(|a| a.status.is_active()).count();

        Ok(CustomerStats {
            total_appointments: history.len(),
            completed_appointments: completed,
            cancelled_appointments: cancelled,
            pending_appointments: pending,
            // History is ordered most recent first.
            last_appointment_date: history.first().map(|a| a.appointment_date),
            is_frequent_customer: completed >= 3,
        })
    }

    /// Customer header plus history block, used verbatim in chat replies.
    pub async fn chat_summary(&self, customer_id: Uuid) -> Result<String, CustomerError> {
        let customer = self.find_by_id(customer_id).await?;
        let stats = self.get_stats(customer_id).await?;

        let mut summary = format!(
            "👤 *{}*\n📱 {}\n",
            customer.name,
            Self::format_phone(&customer.phone_number)
        );
        if customer.has_address() {
            summary.push_str(&format!("📍 {}\n", customer.address));
        }
        summary.push_str(&format!(
            "\n📊 *Historial:*\n• Total citas: {}\n• Completadas: {}\n• Pendientes: {}\n",
            stats.total_appointments, stats.completed_appointments, stats.pending_appointments
        ));
        if let Some(last) = stats.last_appointment_date {
            summary.push_str(&format!("• Última cita: {}\n", last.format("%d/%m/%Y")));
        }
        if stats.is_frequent_customer {
            summary.push_str("\n⭐ Cliente frecuente");
        }
        Ok(summary)
    }
}
