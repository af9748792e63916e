// libs/appointment-cell/src/services/availability.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::ScheduleStore;
use shared_utils::Clock;

use crate::models::{AppointmentError, AvailabilitySlot, DayCapacity};

/// Computes the free/busy grid over the slot catalog. A (date, slot) cell is
/// available while its active booking count stays below the configured
/// capacity; cells already past today's wall clock are dropped entirely.
pub struct AvailabilityService {
    store: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    config: AppConfig,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn ScheduleStore>, clock: Arc<dyn Clock>, config: AppConfig) -> Self {
        Self { store, clock, config }
    }

    fn validate_range(&self, from: NaiveDate, to: NaiveDate) -> Result<(), AppointmentError> {
        let today = self.clock.today();

        if from < today {
            return Err(AppointmentError::Validation(
                "No se pueden consultar fechas pasadas.".to_string(),
            ));
        }
        if to < from {
            return Err(AppointmentError::Validation(
                "El rango de fechas es inválido.".to_string(),
            ));
        }
        if (to - from).num_days() > self.config.max_range_days {
            return Err(AppointmentError::Validation(format!(
                "El rango de consulta no puede exceder {} días.",
                self.config.max_range_days
            )));
        }
        if from > today + Duration::days(self.config.max_advance_days) {
            return Err(AppointmentError::Validation(format!(
                "Solo se puede consultar disponibilidad hasta {} días de anticipación.",
                self.config.max_advance_days
            )));
        }
        Ok(())
    }

    /// The full grid for `[from, to]`, ordered by date then slot start. Cells
    /// on `from == today` whose slot already started are omitted.
    pub async fn compute_availability(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>, AppointmentError> {
        self.validate_range(from, to)?;

        let now = self.clock.now();
        let today = now.date();
        let slots = self.store.active_slots().await?;

        let mut grid = Vec::new();
        let mut date = from;
        while date <= to {
            for slot in &slots {
                if date == today && slot.start_time <= now.time() {
                    continue;
                }
                let booked = self.store.count_active(date, slot.id).await?;
                grid.push(AvailabilitySlot {
                    date,
                    time_slot: slot.clone(),
                    available: booked < self.config.slot_capacity,
                    booked_count: booked,
                });
            }
            date = date + Duration::days(1);
        }

        debug!("Availability grid {} - {}: {} cells", from, to, grid.len());
        Ok(grid)
    }

    pub async fn is_available(
        &self,
        date: NaiveDate,
        slot_id: Uuid,
    ) -> Result<bool, AppointmentError> {
        let grid = self.compute_availability(date, date).await?;
        Ok(grid
            .iter()
            .any(|cell| cell.time_slot.id == slot_id && cell.available))
    }

    /// Earliest free cell within the configured lookahead window.
    pub async fn next_available_slot(&self) -> Result<Option<AvailabilitySlot>, AppointmentError> {
        let today = self.clock.today();
        let to = today + Duration::days(self.config.next_slot_lookahead_days);
        let grid = self.compute_availability(today, to).await?;
        Ok(grid.into_iter().find(|cell| cell.available))
    }

    /// Capacity digest for one day, counting bookable positions across all
    /// active slots.
    pub async fn day_capacity(&self, date: NaiveDate) -> Result<DayCapacity, AppointmentError> {
        let slots = self.store.active_slots().await?;
        let capacity = self.config.slot_capacity as usize;

        let mut booked_total = 0usize;
        for slot in &slots {
            booked_total += self.store.count_active(date, slot.id).await? as usize;
        }

        let total = slots.len() * capacity;
        let available = total.saturating_sub(booked_total);
        let percentage = if total == 0 {
            0
        } else {
            (booked_total * 100 / total) as u32
        };

        Ok(DayCapacity {
            date,
            total_slots: total,
            available_slots: available,
            booked_slots: booked_total,
            capacity_percentage: percentage,
            is_full: total > 0 && available == 0,
        })
    }

    /// Chat-ready digest of `days` days starting at `from`, one bullet per
    /// day that still has free cells.
    pub async fn availability_summary(
        &self,
        from: NaiveDate,
        days: i64,
    ) -> Result<String, AppointmentError> {
        let today = self.clock.today();
        let to = from + Duration::days(days.max(1) - 1);
        let grid = self.compute_availability(from, to).await?;

        let mut lines: Vec<String> = Vec::new();
        let mut date = from;
        while date <= to {
            let free: Vec<String> = grid
                .iter()
                .filter(|cell| cell.date == date && cell.available)
                .map(|cell| {
                    format!(
                        "{} - {}",
                        cell.time_slot.start_time.format("%H:%M"),
                        cell.time_slot.end_time.format("%H:%M")
                    )
                })
                .collect();
            if !free.is_empty() {
                lines.push(format!(
                    "• *{}*: {}",
                    date_label(date, today),
                    free.join(", ")
                ));
            }
            date = date + Duration::days(1);
        }

        if lines.is_empty() {
            return Ok("😔 No hay horarios disponibles en los próximos días.".to_string());
        }

        Ok(format!(
            "📅 *Horarios disponibles:*\n\n{}",
            lines.join("\n")
        ))
    }
}

/// Relative Spanish label for a date: "Hoy", "Mañana", or weekday plus
/// day/month.
fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Hoy".to_string(),
        1 => "Mañana".to_string(),
        _ => format!("{} {}", weekday_es(date.weekday()), date.format("%d/%m")),
    }
}

fn weekday_es(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}
