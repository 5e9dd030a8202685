//! Rollover timing and auction pricing.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::DEFAULT_DELAY_SECS;

/// Rollover configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverConfig {
    /// Seconds between committing an option and rolling into it.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// Auction duration in seconds.
    #[serde(default = "default_auction_duration_secs")]
    pub auction_duration_secs: u64,
    /// Fraction of the premium used as the auction minimum price.
    #[serde(default = "default_premium_discount")]
    pub premium_discount: Decimal,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            auction_duration_secs: default_auction_duration_secs(),
            premium_discount: default_premium_discount(),
        }
    }
}

const fn default_delay_secs() -> u64 {
    DEFAULT_DELAY_SECS
}

const fn default_auction_duration_secs() -> u64 {
    3_600
}

const fn default_premium_discount() -> Decimal {
    dec!(0.95)
}
