//! Derivatives protocol adapters.

mod simulated;

pub use simulated::SimulatedDerivativesProtocol;
