//! Clock sources feeding `now` into the pipeline

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::Timestamp;

/// Source of timestamps for frames and timer ticks
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock backed by the OS, starting at zero when created
/// INVARIANT: never goes backwards
pub struct MonotonicClock {
    reference: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            reference: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_micros(self.reference.elapsed().as_micros() as i64)
    }
}

/// Manually driven clock for simulations and tests
pub struct ManualClock {
    value: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            value: Mutex::new(start),
        }
    }

    /// Jump to a specific time; only moves forward
    pub fn set(&self, target: Timestamp) {
        let mut value = self.value.lock();
        if target > *value {
            *value = target;
        }
    }

    /// Advance by a duration and return the new time
    pub fn advance(&self, dt: Duration) -> Timestamp {
        let mut value = self.value.lock();
        *value = value.saturating_add(dt);
        *value
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Timestamp::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.value.lock()
    }
}
