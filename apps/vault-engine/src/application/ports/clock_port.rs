//! Clock Port (Driven Port)

use crate::domain::shared::Timestamp;

/// Source of the current time.
pub trait ClockPort: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
