//! Clock adapters.

mod manual;

pub use crate::application::ports::SystemClock;
pub use manual::ManualClock;
