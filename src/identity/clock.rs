use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Wall-clock source. Session validity is a function of stored state and `now()`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// Settable clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self { Self { now: Mutex::new(start) } }

    pub fn set(&self, at: DateTime<Utc>) { *self.now.lock() = at; }

    pub fn advance(&self, by: chrono::Duration) {
        let mut g = self.now.lock();
        *g += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> { *self.now.lock() }
}
