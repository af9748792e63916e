// libs/customer-cell/tests/directory_test.rs
use assert_matches::assert_matches;
use std::sync::Arc;

use customer_cell::models::CustomerError;
use customer_cell::services::directory::CustomerDirectoryService;
use shared_database::{MemoryStore, ScheduleStore};
use shared_models::{NewAppointment, SampleType};
use shared_utils::test_utils::{date, seeded_store};

fn directory(store: Arc<MemoryStore>) -> CustomerDirectoryService {
    CustomerDirectoryService::new(store)
}

#[test]
fn phone_normalization_matrix() {
    let cases = [
        ("3001234567", "3001234567"),
        ("573001234567", "3001234567"),
        ("+57 300 123 4567", "3001234567"),
        ("300-123-4567", "3001234567"),
        // 7-digit landline gets the Valle area code.
        ("2281234", "22281234"),
    ];
    for (input, expected) in cases {
        assert_eq!(CustomerDirectoryService::normalize_phone(input), expected);
    }
}

#[test]
fn phone_validation_matrix() {
    for valid in ["3001234567", "573001234567", "+57 300 123 4567", "2281234", "2281234567"] {
        assert!(
            CustomerDirectoryService::is_valid_colombian_phone(valid),
            "{valid} should be valid"
        );
    }
    for invalid in ["12345", "1234567890", "570001234567", "abc", ""] {
        assert!(
            !CustomerDirectoryService::is_valid_colombian_phone(invalid),
            "{invalid} should be invalid"
        );
    }
}

#[test]
fn phones_format_for_chat() {
    assert_eq!(
        CustomerDirectoryService::format_phone("573001234567"),
        "300 123 4567"
    );
    assert_eq!(
        CustomerDirectoryService::format_phone("2281234567"),
        "(2) 281 234567"
    );
}

#[tokio::test]
async fn find_or_create_is_idempotent_per_phone() {
    let store = Arc::new(MemoryStore::new());
    let directory = directory(store);

    let first = directory
        .find_or_create("+57 300 123 4567", Some("Ana"))
        .await
        .unwrap();
    assert_eq!(first.phone_number, "3001234567");
    assert_eq!(first.name, "Ana");
    assert!(!first.has_address());

    // Same number in a different format resolves to the same record.
    let second = directory
        .find_or_create("3001234567", Some("Otro Nombre"))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.name, "Ana");
}

#[tokio::test]
async fn unnamed_first_contact_gets_the_default_display_name() {
    let store = Arc::new(MemoryStore::new());
    let directory = directory(store);

    let customer = directory.find_or_create("3009876543", None).await.unwrap();
    assert_eq!(customer.name, "Cliente WhatsApp");

    assert_matches!(
        directory.find_or_create("12345", None).await,
        Err(CustomerError::Validation(_))
    );
}

#[tokio::test]
async fn address_heuristics_gate_the_service_area() {
    let store = Arc::new(MemoryStore::new());
    let directory = directory(store);
    let customer = directory.find_or_create("3001234567", None).await.unwrap();

    let accepted = directory
        .update_address(customer.id, "Barrio Centro, Carrera 5 #10-25")
        .await
        .unwrap();
    assert_eq!(accepted.address, "Barrio Centro, Carrera 5 #10-25");

    assert_matches!(
        directory
            .update_address(customer.id, "Vereda La Esperanza, finca El Paraíso")
            .await,
        Err(CustomerError::OutOfServiceArea)
    );
    assert_matches!(
        directory.update_address(customer.id, "San Pedro, Calle 25 #30-15").await,
        Err(CustomerError::OutOfServiceArea)
    );
    // An urban token alone is not enough detail.
    assert_matches!(
        directory.update_address(customer.id, "Calle 10").await,
        Err(CustomerError::AddressTooVague)
    );
    // No recognizable urban indicator at all.
    assert_matches!(
        directory.update_address(customer.id, "por la esquina del parque").await,
        Err(CustomerError::AddressTooVague)
    );
    assert_matches!(
        directory.update_address(customer.id, "   ").await,
        Err(CustomerError::Validation(_))
    );
}

#[tokio::test]
async fn stats_mark_frequent_customers() {
    let (store, slot) = seeded_store().await;
    let directory = directory(store.clone());
    let customer = directory.find_or_create("3001234567", None).await.unwrap();

    assert!(!directory.has_active_appointment(customer.id).await.unwrap());

    for day in 1..=4 {
        let appointment = store
            .insert_appointment_checked(
                NewAppointment {
                    customer_id: customer.id,
                    appointment_date: date(2025, 5, day),
                    time_slot_id: slot.id,
                    sample_type: SampleType::SangreVenosa,
                    special_instructions: None,
                    total_amount_cop: 20_000,
                },
                10,
            )
            .await
            .unwrap();
        // Three visits completed, the fourth still pending.
        if day < 4 {
            store
                .update_status(appointment.id, shared_models::AppointmentStatus::Completed)
                .await
                .unwrap();
        }
    }

    assert!(directory.has_active_appointment(customer.id).await.unwrap());

    let stats = directory.get_stats(customer.id).await.unwrap();
    assert_eq!(stats.total_appointments, 4);
    assert_eq!(stats.completed_appointments, 3);
    assert_eq!(stats.pending_appointments, 1);
    assert_eq!(stats.cancelled_appointments, 0);
    assert_eq!(stats.last_appointment_date, Some(date(2025, 5, 4)));
    assert!(stats.is_frequent_customer);

    let summary = directory.chat_summary(customer.id).await.unwrap();
    assert!(summary.contains("Cliente frecuente"));
    assert!(summary.contains("300 123 4567"));
}
