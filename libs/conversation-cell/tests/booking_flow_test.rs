// libs/conversation-cell/tests/booking_flow_test.rs
use assert_matches::assert_matches;
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use appointment_cell::services::availability::AvailabilityService;
use appointment_cell::services::booking::AppointmentBookingService;
use appointment_cell::services::notifications::LogNotificationSink;
use conversation_cell::models::{BookingStep, ConversationError};
use conversation_cell::services::flow::BookingFlowService;
use customer_cell::services::directory::CustomerDirectoryService;
use shared_config::AppConfig;
use shared_database::{MemoryStore, ScheduleStore};
use shared_models::{AppointmentStatus, NewAppointment, SampleType, TimeSlot};
use shared_utils::test_utils::{date, seeded_store, FixedClock};

struct World {
    store: Arc<MemoryStore>,
    slot: TimeSlot,
    customer_id: Uuid,
    flow: BookingFlowService,
}

/// Full stack on the in-memory store: Monday 2025-06-02 at 10:00, one
/// 05:30 - 06:30 catalog slot, one registered customer without an address.
async fn world() -> World {
    let (store, slot) = seeded_store().await;
    let clock = Arc::new(FixedClock::on_date(date(2025, 6, 2), 10, 0));
    let config = AppConfig::default();

    let directory = Arc::new(CustomerDirectoryService::new(store.clone()));
    let notifier = Arc::new(LogNotificationSink);
    let booking = Arc::new(AppointmentBookingService::new(
        store.clone(),
        clock.clone(),
        notifier,
        config.clone(),
    ));
    let availability = Arc::new(AvailabilityService::new(
        store.clone(),
        clock.clone(),
        config,
    ));

    let customer = directory
        .find_or_create("3001234567", Some("Ana"))
        .await
        .unwrap();

    World {
        store,
        slot,
        customer_id: customer.id,
        flow: BookingFlowService::new(directory, booking, availability, clock),
    }
}

#[tokio::test]
async fn full_booking_conversation_places_one_appointment() {
    let w = world().await;
    let tomorrow = date(2025, 6, 3);

    // No address on file yet, so the flow collects one first.
    let reply = w.flow.start_booking(w.customer_id).await.unwrap();
    assert_eq!(reply.step, BookingStep::CollectAddress);

    let reply = w
        .flow
        .submit_input(w.customer_id, "Barrio Centro, Carrera 5 #10-25")
        .await
        .unwrap();
    assert_eq!(reply.step, BookingStep::SelectDate);
    assert!(reply.prompt.contains("Dirección registrada"));

    let reply = w.flow.submit_input(w.customer_id, "mañana").await.unwrap();
    assert_eq!(reply.step, BookingStep::SelectTime);
    assert!(reply.prompt.contains("05:30 - 06:30"));

    let reply = w.flow.submit_input(w.customer_id, "1").await.unwrap();
    assert_eq!(reply.step, BookingStep::SelectSampleType);
    assert!(reply.prompt.contains("Orina"));

    // "Orina" is option 3 in the sample menu.
    let reply = w.flow.submit_input(w.customer_id, "3").await.unwrap();
    assert_eq!(reply.step, BookingStep::Confirm);
    assert!(reply.prompt.contains("03/06/2025"));
    assert!(reply.prompt.contains("Orina"));

    let reply = w.flow.submit_input(w.customer_id, "sí").await.unwrap();
    assert_eq!(reply.step, BookingStep::Booked);
    assert!(reply.terminal);
    assert!(reply.prompt.contains("20.000"));

    // Exactly one active booking against the (date, slot) pair.
    assert_eq!(w.store.count_active(tomorrow, w.slot.id).await.unwrap(), 1);
    let booked = w
        .store
        .appointments_for_customer(w.customer_id, None, None)
        .await
        .unwrap();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0].status, AppointmentStatus::Scheduled);
    assert_eq!(booked[0].sample_type, SampleType::Orina);
    assert_eq!(booked[0].total_amount_cop, 20_000);
    assert_eq!(booked[0].appointment_date, tomorrow);

    // The terminal turn discarded the session.
    assert_matches!(
        w.flow.submit_input(w.customer_id, "hola").await,
        Err(ConversationError::NoSession)
    );
}

#[tokio::test]
async fn customers_with_a_live_appointment_are_turned_away() {
    let w = world().await;
    w.store
        .insert_appointment_checked(
            NewAppointment {
                customer_id: w.customer_id,
                appointment_date: date(2025, 6, 5),
                time_slot_id: w.slot.id,
                sample_type: SampleType::Orina,
                special_instructions: None,
                total_amount_cop: 20_000,
            },
            10,
        )
        .await
        .unwrap();

    let reply = w.flow.start_booking(w.customer_id).await.unwrap();
    assert_eq!(reply.step, BookingStep::Aborted);
    assert!(reply.terminal);
    assert!(reply.prompt.contains("cita activa"));
}

#[tokio::test]
async fn rejected_addresses_re_prompt_in_place() {
    let w = world().await;
    w.flow.start_booking(w.customer_id).await.unwrap();

    // Out of the service perimeter.
    let reply = w
        .flow
        .submit_input(w.customer_id, "Vereda La Esperanza, finca El Paraíso")
        .await
        .unwrap();
    assert_eq!(reply.step, BookingStep::CollectAddress);

    // Too vague: an urban token but only two components.
    let reply = w.flow.submit_input(w.customer_id, "Calle 10").await.unwrap();
    assert_eq!(reply.step, BookingStep::CollectAddress);

    // A proper address moves the conversation forward.
    let reply = w
        .flow
        .submit_input(w.customer_id, "Barrio José María Cabal, Calle 10 #15-20")
        .await
        .unwrap();
    assert_eq!(reply.step, BookingStep::SelectDate);
}

#[tokio::test]
async fn invalid_choices_re_prompt_without_losing_progress() {
    let w = world().await;
    w.flow.start_booking(w.customer_id).await.unwrap();
    w.flow
        .submit_input(w.customer_id, "Barrio Centro, Carrera 5 #10-25")
        .await
        .unwrap();

    let reply = w
        .flow
        .submit_input(w.customer_id, "el martes que viene")
        .await
        .unwrap();
    assert_eq!(reply.step, BookingStep::SelectDate);
    assert!(reply.prompt.contains("No entendí la fecha"));

    w.flow.submit_input(w.customer_id, "mañana").await.unwrap();

    let reply = w.flow.submit_input(w.customer_id, "9").await.unwrap();
    assert_eq!(reply.step, BookingStep::SelectTime);

    w.flow.submit_input(w.customer_id, "1").await.unwrap();

    let reply = w.flow.submit_input(w.customer_id, "0").await.unwrap();
    assert_eq!(reply.step, BookingStep::SelectSampleType);

    let reply = w.flow.submit_input(w.customer_id, "3").await.unwrap();
    assert_eq!(reply.step, BookingStep::Confirm);

    // Unrecognized confirmation input keeps asking.
    let reply = w.flow.submit_input(w.customer_id, "tal vez").await.unwrap();
    assert_eq!(reply.step, BookingStep::Confirm);
}

#[tokio::test]
async fn modify_backtracks_to_the_named_field() {
    let w = world().await;
    w.flow.start_booking(w.customer_id).await.unwrap();
    w.flow
        .submit_input(w.customer_id, "Barrio Centro, Carrera 5 #10-25")
        .await
        .unwrap();
    w.flow.submit_input(w.customer_id, "mañana").await.unwrap();
    w.flow.submit_input(w.customer_id, "1").await.unwrap();
    w.flow.submit_input(w.customer_id, "1").await.unwrap();

    let reply = w.flow.submit_input(w.customer_id, "cambiar").await.unwrap();
    assert_eq!(reply.step, BookingStep::Modify);

    // Re-pick the sample type, then land back on confirmation.
    let reply = w.flow.submit_input(w.customer_id, "3").await.unwrap();
    assert_eq!(reply.step, BookingStep::SelectSampleType);

    let reply = w.flow.submit_input(w.customer_id, "3").await.unwrap();
    assert_eq!(reply.step, BookingStep::Confirm);
    assert!(reply.prompt.contains("Orina"));

    let reply = w.flow.submit_input(w.customer_id, "confirmar").await.unwrap();
    assert_eq!(reply.step, BookingStep::Booked);
}

#[tokio::test]
async fn cancel_keyword_aborts_from_any_state() {
    let w = world().await;
    w.flow.start_booking(w.customer_id).await.unwrap();
    w.flow
        .submit_input(w.customer_id, "Barrio Centro, Carrera 5 #10-25")
        .await
        .unwrap();

    let reply = w.flow.submit_input(w.customer_id, "cancelar").await.unwrap();
    assert_eq!(reply.step, BookingStep::Aborted);
    assert!(reply.terminal);

    assert_matches!(
        w.flow.submit_input(w.customer_id, "mañana").await,
        Err(ConversationError::NoSession)
    );
    assert_eq!(
        w.store
            .appointments_for_customer(w.customer_id, None, None)
            .await
            .unwrap()
            .len(),
        0
    );
}

#[tokio::test]
async fn losing_the_last_place_routes_back_to_date_selection() {
    let w = world().await;
    let tomorrow = date(2025, 6, 2) + Duration::days(1);

    w.flow.start_booking(w.customer_id).await.unwrap();
    w.flow
        .submit_input(w.customer_id, "Barrio Centro, Carrera 5 #10-25")
        .await
        .unwrap();
    w.flow.submit_input(w.customer_id, "mañana").await.unwrap();
    w.flow.submit_input(w.customer_id, "1").await.unwrap();
    w.flow.submit_input(w.customer_id, "3").await.unwrap();

    // While the customer hesitates, other bookings fill the slot.
    for _ in 0..10 {
        w.store
            .insert_appointment_checked(
                NewAppointment {
                    customer_id: Uuid::new_v4(),
                    appointment_date: tomorrow,
                    time_slot_id: w.slot.id,
                    sample_type: SampleType::SangreVenosa,
                    special_instructions: None,
                    total_amount_cop: 20_000,
                },
                10,
            )
            .await
            .unwrap();
    }

    let reply = w.flow.submit_input(w.customer_id, "sí").await.unwrap();
    assert_eq!(reply.step, BookingStep::SelectDate);
    assert!(reply.prompt.contains("se acaba de llenar"));

    // The session survived and the customer can pick a new date.
    let reply = w
        .flow
        .submit_input(w.customer_id, "4 de junio")
        .await
        .unwrap();
    assert_eq!(reply.step, BookingStep::SelectTime);
}
