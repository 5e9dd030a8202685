//! Strike selection adapters.

mod manual;

pub use manual::ManualStrikeSelector;
