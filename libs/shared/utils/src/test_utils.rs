// libs/shared/utils/src/test_utils.rs
//
// Shared fixtures for the cell test suites: a settable clock and a seeded
// in-memory store matching the production slot catalog.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::{Arc, Mutex};

use shared_database::MemoryStore;
use shared_models::TimeSlot;

use crate::clock::Clock;

/// Deterministic clock for tests. Interior mutability lets a test advance
/// time mid-scenario without re-wiring services.
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn on_date(date: NaiveDate, hour: u32, minute: u32) -> Self {
        Self::at(date.and_time(hhmm(hour, minute)))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

pub fn hhmm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Store pre-seeded with the production early-morning sampling window.
pub async fn seeded_store() -> (Arc<MemoryStore>, TimeSlot) {
    let store = Arc::new(MemoryStore::new());
    let slot = store.seed_slot(hhmm(5, 30), hhmm(6, 30)).await;
    (store, slot)
}
