use chrono::NaiveTime;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appointment_cell::services::availability::AvailabilityService;
use appointment_cell::services::booking::AppointmentBookingService;
use appointment_cell::services::cancellation::CancellationPolicy;
use appointment_cell::services::notifications::LogNotificationSink;
use conversation_cell::services::flow::BookingFlowService;
use customer_cell::services::directory::CustomerDirectoryService;
use shared_config::AppConfig;
use shared_database::MemoryStore;
use shared_utils::{Clock, SystemClock};

/// Replays a scripted booking conversation and a cancellation against the
/// in-memory stack, printing each exchange.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scheduling demo");

    // Load configuration
    let config = AppConfig::from_env();

    // Reference backend seeded with the early-morning sampling window.
    let store = Arc::new(MemoryStore::new());
    let window_start = NaiveTime::from_hms_opt(5, 30, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid sampling window start"))?;
    let window_end = NaiveTime::from_hms_opt(6, 30, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid sampling window end"))?;
    let sampling_window = store.seed_slot(window_start, window_end).await;
    info!(
        "Seeded catalog slot {} - {}",
        sampling_window.start_time.format("%H:%M"),
        sampling_window.end_time.format("%H:%M")
    );

    // Wire the cells.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier = Arc::new(LogNotificationSink);
    let directory = Arc::new(CustomerDirectoryService::new(store.clone()));
    let booking = Arc::new(AppointmentBookingService::new(
        store.clone(),
        clock.clone(),
        notifier.clone(),
        config.clone(),
    ));
    let availability = Arc::new(AvailabilityService::new(
        store.clone(),
        clock.clone(),
        config.clone(),
    ));
    let cancellation = CancellationPolicy::new(store.clone(), clock.clone(), notifier, config);
    let flow = BookingFlowService::new(directory.clone(), booking.clone(), availability, clock);

    // First contact registers the customer from their phone number.
    let customer = directory.find_or_create("+57 300 123 4567", Some("Ana")).await?;
    println!("== Nueva conversación con {} ==\n", customer.name);

    let reply = flow.start_booking(customer.id).await?;
    println!("bot> {}\n", reply.prompt);

    let turns = [
        "Barrio Centro, Carrera 5 #10-25",
        "mañana",
        "1",
        "3",
        "sí",
    ];
    for turn in turns {
        println!("{}> {}", customer.name, turn);
        let reply = flow.submit_input(customer.id, turn).await?;
        println!("bot> {}\n", reply.prompt);
        if reply.terminal {
            break;
        }
    }

    let appointment = booking
        .active_appointment(customer.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("the scripted booking should be active"))?;
    println!(
        "== Cita {} registrada para el {} ==\n",
        appointment.short_id(),
        appointment.appointment_date.format("%d/%m/%Y")
    );

    // And cancel it again, honoring the notice window.
    let assessment = cancellation.assess(appointment.id).await?;
    println!(
        "Faltan {} minutos; ¿requiere doble confirmación? {}",
        assessment.minutes_remaining, assessment.requires_late_override
    );
    let cancelled = cancellation
        .cancel(appointment.id, assessment.requires_late_override)
        .await?;
    println!("Cita {} cancelada.", cancelled.short_id());

    Ok(())
}
