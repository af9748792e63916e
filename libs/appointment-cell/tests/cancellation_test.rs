// libs/appointment-cell/tests/cancellation_test.rs
use assert_matches::assert_matches;
use std::sync::Arc;
use uuid::Uuid;

use appointment_cell::models::AppointmentError;
use appointment_cell::services::cancellation::CancellationPolicy;
use appointment_cell::services::notifications::LogNotificationSink;
use shared_config::AppConfig;
use shared_database::{MemoryStore, ScheduleStore};
use shared_models::{AppointmentStatus, NewAppointment, SampleType};
use shared_utils::test_utils::{date, seeded_store, FixedClock};

fn policy(store: Arc<MemoryStore>, clock: Arc<FixedClock>) -> CancellationPolicy {
    CancellationPolicy::new(
        store,
        clock,
        Arc::new(LogNotificationSink),
        AppConfig::default(),
    )
}

async fn seed_appointment(store: &MemoryStore, d: chrono::NaiveDate, slot_id: Uuid) -> Uuid {
    store
        .insert_appointment_checked(
            NewAppointment {
                customer_id: Uuid::new_v4(),
                appointment_date: d,
                time_slot_id: slot_id,
                sample_type: SampleType::Orina,
                special_instructions: None,
                total_amount_cop: 20_000,
            },
            10,
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn ample_notice_cancels_without_override() {
    let (store, slot) = seeded_store().await;
    // Appointment tomorrow 05:30, cancelled the evening before.
    let id = seed_appointment(&store, date(2025, 6, 3), slot.id).await;
    let clock = Arc::new(FixedClock::on_date(date(2025, 6, 2), 20, 0));
    let policy = policy(store.clone(), clock);

    let assessment = policy.assess(id).await.unwrap();
    assert!(assessment.allowed);
    assert!(!assessment.requires_late_override);
    assert_eq!(assessment.minutes_remaining, 9 * 60 + 30);

    let cancelled = policy.cancel(id, false).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert!(cancelled.special_instructions.is_none());
}

#[tokio::test]
async fn late_cancellation_requires_explicit_override() {
    let (store, slot) = seeded_store().await;
    // 04:00 the same morning: 90 minutes before the 05:30 start.
    let id = seed_appointment(&store, date(2025, 6, 3), slot.id).await;
    let clock = Arc::new(FixedClock::on_date(date(2025, 6, 3), 4, 0));
    let policy = policy(store.clone(), clock);

    let assessment = policy.assess(id).await.unwrap();
    assert!(assessment.requires_late_override);
    assert_eq!(assessment.minutes_remaining, 90);

    assert_matches!(
        policy.cancel(id, false).await,
        Err(AppointmentError::LateConfirmationRequired { minutes_remaining: 90 })
    );

    // The record is untouched by the rejected attempt.
    let current = store.appointment_by_id(id).await.unwrap().unwrap();
    assert_eq!(current.status, AppointmentStatus::Scheduled);

    let cancelled = policy.cancel(id, true).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert!(cancelled
        .special_instructions
        .unwrap()
        .contains("Cancelación tardía"));
}

#[tokio::test]
async fn exact_notice_boundary_is_not_late() {
    let (store, slot) = seeded_store().await;
    // 03:30, exactly 120 minutes before the 05:30 start.
    let id = seed_appointment(&store, date(2025, 6, 3), slot.id).await;
    let clock = Arc::new(FixedClock::on_date(date(2025, 6, 3), 3, 30));
    let policy = policy(store, clock);

    let assessment = policy.assess(id).await.unwrap();
    assert_eq!(assessment.minutes_remaining, 120);
    assert!(!assessment.requires_late_override);
}

#[tokio::test]
async fn terminal_appointments_cannot_be_cancelled() {
    let (store, slot) = seeded_store().await;
    let id = seed_appointment(&store, date(2025, 6, 3), slot.id).await;
    store
        .update_status(id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let clock = Arc::new(FixedClock::on_date(date(2025, 6, 2), 10, 0));
    let policy = policy(store, clock);

    assert!(!policy.assess(id).await.unwrap().allowed);
    assert_matches!(
        policy.cancel(id, true).await,
        Err(AppointmentError::InvalidTransition { .. })
    );
}
