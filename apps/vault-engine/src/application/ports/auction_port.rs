//! Auction Port (Driven Port)
//!
//! Interface to the venue that sells the minted option supply.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AuctionId, OptionId};

/// Request to auction option supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionRequest {
    /// Series sold.
    pub option_id: OptionId,
    /// Supply offered.
    pub sell_amount: u128,
    /// Asset bids are paid in.
    pub bidding_asset: String,
    /// Minimum price per option, in asset.
    pub min_price: Decimal,
    /// Duration in seconds.
    pub duration_secs: u64,
}

/// Result of a finished auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSettlement {
    /// Asset base units received.
    pub proceeds: u128,
    /// Supply left unsold.
    pub unsold_supply: u128,
}

/// Auction error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuctionError {
    /// Unknown auction.
    #[error("Auction not found: {auction_id}")]
    NotFound { auction_id: String },

    /// Auction still running.
    #[error("Auction {auction_id} has not finished")]
    NotFinished { auction_id: String },

    /// Venue rejected the request.
    #[error("Auction rejected: {reason}")]
    Rejected { reason: String },

    /// Venue unreachable.
    #[error("Auction venue unavailable: {message}")]
    Unavailable { message: String },
}

/// Port for the auction venue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuctionPort: Send + Sync {
    /// Open an auction.
    async fn open(&self, request: AuctionRequest) -> Result<AuctionId, AuctionError>;

    /// Settle a finished auction.
    async fn settle(&self, auction_id: &AuctionId) -> Result<AuctionSettlement, AuctionError>;
}
