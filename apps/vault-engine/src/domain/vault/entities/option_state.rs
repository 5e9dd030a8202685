//! Option series and auction bookkeeping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AuctionId, OptionId, Timestamp};

/// An option series selected for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSeries {
    /// Series identifier from the derivatives protocol.
    pub id: OptionId,
    /// Strike price in quote units.
    pub strike: Decimal,
    /// Expiry.
    pub expiry: Timestamp,
    /// Put (true) or call (false).
    pub is_put: bool,
}

/// Result reported by the auction venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionOutcome {
    /// Asset received from buyers.
    pub proceeds: u128,
    /// Option supply left unsold.
    pub unsold_supply: u128,
    /// Whether the unsold supply has been burned.
    pub burned: bool,
}

/// Auction of the minted option supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    /// Auction identifier.
    pub id: AuctionId,
    /// Option supply offered.
    pub supply: u128,
    /// Minimum clearing price, asset per option.
    pub min_price: Decimal,
    /// Settlement result, once known.
    pub outcome: Option<AuctionOutcome>,
}

/// The option the vault is currently short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOption {
    /// Series being written.
    pub series: OptionSeries,
    /// Collateral locked when the position was opened.
    pub collateral: u128,
    /// Supply minted against the locked collateral.
    pub minted_supply: u128,
    /// Supply burned after the auction.
    pub burned_supply: u128,
    /// Auction of the minted supply; `None` when nothing was minted.
    pub auction: Option<AuctionState>,
}

impl ActiveOption {
    /// Minted supply still outstanding.
    #[must_use]
    pub const fn outstanding_supply(&self) -> u128 {
        self.minted_supply.saturating_sub(self.burned_supply)
    }
}

/// Manual strike set by the owner, tied to the round it was set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeOverride {
    /// Strike to use.
    pub strike: Decimal,
    /// Round in which the override was set.
    pub round: u64,
}
