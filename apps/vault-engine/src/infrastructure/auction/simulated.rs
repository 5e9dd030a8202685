//! In-memory auction venue.
//!
//! Every auction clears at its minimum price and sells `fill_ratio` of the
//! offered supply.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::application::ports::{AuctionError, AuctionPort, AuctionRequest, AuctionSettlement};
use crate::domain::shared::AuctionId;

#[derive(Debug, Clone)]
struct AuctionRecord {
    request: AuctionRequest,
    settled: bool,
}

/// Simulated auction venue.
#[derive(Debug)]
pub struct SimulatedAuction {
    fill_ratio: RwLock<Decimal>,
    auctions: RwLock<HashMap<AuctionId, AuctionRecord>>,
}

impl SimulatedAuction {
    /// Create a venue that fills `fill_ratio` (clamped to `[0, 1]`) of each auction.
    #[must_use]
    pub fn new(fill_ratio: Decimal) -> Self {
        Self {
            fill_ratio: RwLock::new(fill_ratio.clamp(Decimal::ZERO, Decimal::ONE)),
            auctions: RwLock::new(HashMap::new()),
        }
    }

    /// Change the fill ratio for auctions settled from now on.
    pub fn set_fill_ratio(&self, fill_ratio: Decimal) {
        *self
            .fill_ratio
            .write()
            .unwrap_or_else(PoisonError::into_inner) = fill_ratio.clamp(Decimal::ZERO, Decimal::ONE);
    }

    /// Request an auction was opened with.
    #[must_use]
    pub fn request(&self, auction_id: &AuctionId) -> Option<AuctionRequest> {
        self.auctions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(auction_id)
            .map(|record| record.request.clone())
    }

    fn rejected(reason: impl Into<String>) -> AuctionError {
        AuctionError::Rejected {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AuctionPort for SimulatedAuction {
    async fn open(&self, request: AuctionRequest) -> Result<AuctionId, AuctionError> {
        if request.sell_amount == 0 {
            return Err(Self::rejected("nothing to sell"));
        }
        if request.min_price <= Decimal::ZERO {
            return Err(Self::rejected("minimum price must be positive"));
        }
        let id = AuctionId::generate();
        tracing::debug!(
            auction_id = %id,
            option_id = %request.option_id,
            sell_amount = request.sell_amount,
            min_price = %request.min_price,
            "Auction opened"
        );
        self.auctions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id.clone(),
                AuctionRecord {
                    request,
                    settled: false,
                },
            );
        Ok(id)
    }

    async fn settle(&self, auction_id: &AuctionId) -> Result<AuctionSettlement, AuctionError> {
        let fill_ratio = *self
            .fill_ratio
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut auctions = self.auctions.write().unwrap_or_else(PoisonError::into_inner);
        let record = auctions
            .get_mut(auction_id)
            .ok_or_else(|| AuctionError::NotFound {
                auction_id: auction_id.to_string(),
            })?;
        if record.settled {
            return Err(Self::rejected(format!("auction {auction_id} already settled")));
        }

        let supply = record.request.sell_amount;
        let sold = Decimal::from_u128(supply)
            .and_then(|s| s.checked_mul(fill_ratio))
            .and_then(|s| s.floor().to_u128())
            .ok_or_else(|| Self::rejected("supply out of range"))?
            .min(supply);
        let proceeds = Decimal::from_u128(sold)
            .and_then(|s| s.checked_mul(record.request.min_price))
            .and_then(|p| p.floor().to_u128())
            .ok_or_else(|| Self::rejected("proceeds out of range"))?;
        record.settled = true;

        Ok(AuctionSettlement {
            proceeds,
            unsold_supply: supply - sold,
        })
    }
}
