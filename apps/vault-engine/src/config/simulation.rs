//! Parameters for the simulated collaborators used in paper mode.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Strike quoted by the manual selector.
    #[serde(default = "default_strike")]
    pub strike: Decimal,
    /// Premium per option quoted by the manual selector.
    #[serde(default = "default_premium")]
    pub premium: Decimal,
    /// Fraction of each auction that finds buyers.
    #[serde(default = "default_fill_ratio")]
    pub fill_ratio: Decimal,
    /// Underlying price used to settle expired options. Unset settles at the strike.
    #[serde(default)]
    pub expiry_price: Option<Decimal>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            strike: default_strike(),
            premium: default_premium(),
            fill_ratio: default_fill_ratio(),
            expiry_price: None,
        }
    }
}

const fn default_strike() -> Decimal {
    dec!(2000)
}

const fn default_premium() -> Decimal {
    dec!(20)
}

const fn default_fill_ratio() -> Decimal {
    Decimal::ONE
}
