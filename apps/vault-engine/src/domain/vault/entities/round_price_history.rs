//! Append-only round price history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::vault::errors::VaultError;

/// Price-per-share fixed at each round close.
///
/// Entries are written once, in round order, starting at round 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPriceHistory {
    prices: BTreeMap<u64, u128>,
}

impl RoundPriceHistory {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prices: BTreeMap::new(),
        }
    }

    /// Round the next entry must be recorded for.
    #[must_use]
    pub fn next_round(&self) -> u64 {
        self.prices.keys().next_back().map_or(1, |last| last + 1)
    }

    /// Record the closing price of `round`.
    ///
    /// # Errors
    ///
    /// `RoundAlreadyPriced` unless `round` is exactly the next unpriced round.
    pub fn record(&mut self, round: u64, price_per_share: u128) -> Result<(), VaultError> {
        let expected = self.next_round();
        if round != expected {
            return Err(VaultError::RoundAlreadyPriced { round, expected });
        }
        self.prices.insert(round, price_per_share);
        Ok(())
    }

    /// Closing price of `round`, if it has closed.
    #[must_use]
    pub fn price_at(&self, round: u64) -> Option<u128> {
        self.prices.get(&round).copied()
    }

    /// Closing price of `round`.
    ///
    /// # Errors
    ///
    /// `MissingRoundPrice` if the round has not closed.
    pub fn require(&self, round: u64) -> Result<u128, VaultError> {
        self.price_at(round)
            .ok_or(VaultError::MissingRoundPrice { round })
    }

    /// Most recent `(round, price)` entry.
    #[must_use]
    pub fn latest(&self) -> Option<(u64, u128)> {
        self.prices.iter().next_back().map(|(r, p)| (*r, *p))
    }

    /// All entries in round order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u128)> + '_ {
        self.prices.iter().map(|(r, p)| (*r, *p))
    }

    /// Number of closed rounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// True before the first close.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
