//! Domain services: pure ledger arithmetic and rollover rules.

mod expiry;
mod fee_calculator;
mod materialize;
mod rollover_phase;
pub mod share_math;

pub use expiry::{next_expiry, next_friday};
pub use fee_calculator::{FeeCalculator, FeeInputs, SECONDS_PER_YEAR, VaultFees};
pub use materialize::materialize;
pub use rollover_phase::{RolloverPhase, RolloverStateMachine};
pub use share_math::{PriceInputs, ShareMath};
