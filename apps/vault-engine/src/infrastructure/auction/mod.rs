//! Auction venue adapters.

mod simulated;

pub use simulated::SimulatedAuction;
