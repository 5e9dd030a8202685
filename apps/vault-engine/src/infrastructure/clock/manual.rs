//! Manually advanced clock.

use std::sync::{PoisonError, RwLock};

use crate::application::ports::ClockPort;
use crate::domain::shared::Timestamp;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a clock stopped at `now`.
    #[must_use]
    pub const fn new(now: Timestamp) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move forward by `seconds`.
    pub fn advance(&self, seconds: u64) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now = now.plus_seconds(seconds);
    }

    /// Jump to `now`.
    pub fn set(&self, now: Timestamp) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}
