//! Fractional rate value object (fee rates, premium discount).
//!
//! Rates are held as exact decimals and applied to integer base-unit
//! amounts at a fixed scale of `10^9`, always rounding down.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer scale used when applying a rate to base-unit amounts.
pub const RATE_SCALE: u128 = 1_000_000_000;

/// Error constructing a [`Rate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    /// Rate outside of the accepted interval.
    #[error("rate {value} is outside {interval}")]
    OutOfRange {
        /// Offending value.
        value: Decimal,
        /// Accepted interval, human readable.
        interval: &'static str,
    },
}

/// A fraction such as `0.02` (2%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(Decimal);

impl Rate {
    /// Zero rate.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// One (100%).
    pub const ONE: Self = Self(Decimal::ONE);

    /// Fee rate in `[0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns `RateError::OutOfRange` for negative values or values of 100% and above.
    pub fn fee(value: Decimal) -> Result<Self, RateError> {
        if value.is_sign_negative() || value >= Decimal::ONE {
            return Err(RateError::OutOfRange {
                value,
                interval: "[0, 1)",
            });
        }
        Ok(Self(value))
    }

    /// Discount factor in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `RateError::OutOfRange` for zero, negative or greater-than-one values.
    pub fn discount(value: Decimal) -> Result<Self, RateError> {
        if value <= Decimal::ZERO || value > Decimal::ONE {
            return Err(RateError::OutOfRange {
                value,
                interval: "(0, 1]",
            });
        }
        Ok(Self(value))
    }

    /// The rate as a decimal fraction.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Whether this rate is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Rate multiplied by [`RATE_SCALE`], truncated.
    #[must_use]
    pub fn scaled(&self) -> u128 {
        self.0
            .checked_mul(dec!(1_000_000_000))
            .and_then(|v| v.trunc().to_u128())
            .unwrap_or(0)
    }

    /// `floor(amount × rate)`, `None` on overflow.
    #[must_use]
    pub fn apply(&self, amount: u128) -> Option<u128> {
        amount
            .checked_mul(self.scaled())
            .map(|scaled| scaled / RATE_SCALE)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
