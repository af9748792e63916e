use std::env;
use tracing::warn;

/// Business rules for the home-visit sampling service. Every field can be
/// overridden from the environment; defaults match the Buga operation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum non-cancelled appointments per (date, slot) pair.
    pub slot_capacity: u32,
    /// Flat price charged at booking time, in COP.
    pub base_price_cop: i64,
    /// Minimum notice before the scheduled start for a plain cancellation.
    pub cancellation_notice_minutes: i64,
    /// How far ahead bookings and availability queries may reach.
    pub max_advance_days: i64,
    /// Widest date range a single availability query may span.
    pub max_range_days: i64,
    /// Lookahead used when searching for the next free slot.
    pub next_slot_lookahead_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            slot_capacity: read_env("SLOT_CAPACITY", 10),
            base_price_cop: read_env("BASE_PRICE_COP", 20_000),
            cancellation_notice_minutes: read_env("CANCELLATION_NOTICE_MINUTES", 120),
            max_advance_days: read_env("MAX_ADVANCE_DAYS", 90),
            max_range_days: read_env("MAX_RANGE_DAYS", 90),
            next_slot_lookahead_days: read_env("NEXT_SLOT_LOOKAHEAD_DAYS", 30),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slot_capacity: 10,
            base_price_cop: 20_000,
            cancellation_notice_minutes: 120,
            max_advance_days: 90,
            max_range_days: 90,
            next_slot_lookahead_days: 30,
        }
    }
}

fn read_env<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has unparseable value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
