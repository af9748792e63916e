use chrono::{Local, NaiveDate, NaiveDateTime};

/// Injectable wall-clock source. The service operates in a single local
/// market (Buga, America/Bogota), so scheduling math runs on naive local
/// datetimes; tests substitute `test_utils::FixedClock`.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
