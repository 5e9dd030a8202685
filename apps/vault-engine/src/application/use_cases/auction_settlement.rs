//! Auction settlement and burn of unsold supply.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::RolloverError;
use crate::application::ports::{AuctionPort, AuctionSettlement, DerivativesProtocolPort};
use crate::domain::shared::OptionId;
use crate::domain::vault::Vault;

/// Outcome of `burn_remaining_options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnSummary {
    /// Series burned.
    pub option_id: OptionId,
    /// Supply burned.
    pub burned_supply: u128,
    /// Collateral returned to the free balance.
    pub released_collateral: u128,
}

/// Use case for `settle_auction` and `burn_remaining_options`.
pub struct AuctionSettlementUseCase<D, A>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
{
    protocol: Arc<D>,
    auction: Arc<A>,
}

impl<D, A> AuctionSettlementUseCase<D, A>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
{
    /// Create a new `AuctionSettlementUseCase`.
    pub const fn new(protocol: Arc<D>, auction: Arc<A>) -> Self {
        Self { protocol, auction }
    }

    /// Settle the current option's auction and credit its proceeds.
    pub async fn settle(&self, vault: &mut Vault) -> Result<AuctionSettlement, RolloverError> {
        let auction = vault.pending_auction()?.clone();
        let settlement = self.auction.settle(&auction.id).await?;
        if settlement.unsold_supply > auction.supply {
            return Err(RolloverError::invalid_response(
                "auction venue",
                format!(
                    "unsold supply {} exceeds auctioned supply {}",
                    settlement.unsold_supply, auction.supply
                ),
            ));
        }
        vault.record_auction_settlement(settlement.proceeds, settlement.unsold_supply)?;
        Ok(settlement)
    }

    /// Burn the supply a settled auction left unsold.
    pub async fn burn_remaining(&self, vault: &mut Vault) -> Result<BurnSummary, RolloverError> {
        let (option_id, unsold) = vault.burnable_supply()?;
        let released = self.protocol.burn_options(&option_id, unsold).await?;
        let locked = vault.state().locked_amount;
        if released > locked {
            return Err(RolloverError::invalid_response(
                "derivatives protocol",
                format!("released {released} exceeds locked collateral {locked}"),
            ));
        }
        vault.record_options_burned(released)?;
        Ok(BurnSummary {
            option_id,
            burned_supply: unsold,
            released_collateral: released,
        })
    }
}
