//! Roll To Next Option Use Case
//!
//! Locks the vault's free collateral in the committed series, mints the
//! option supply and puts it up for auction.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RolloverError;
use crate::application::ports::{
    AuctionPort, AuctionRequest, DerivativesProtocolPort, OpenPositionRequest, StrikeSelectorPort,
};
use crate::domain::shared::{AuctionId, OptionId, Timestamp};
use crate::domain::vault::entities::AuctionState;
use crate::domain::vault::{OpenRoundParams, Vault};

/// Outcome of a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollSummary {
    /// Current round.
    pub round: u64,
    /// Series now current.
    pub option_id: OptionId,
    /// Collateral locked.
    pub collateral: u128,
    /// Supply minted.
    pub minted_supply: u128,
    /// Auction opened for the supply.
    pub auction_id: Option<AuctionId>,
    /// Auction minimum price per option.
    pub min_price: Option<Decimal>,
}

/// Use case for `roll_to_next_option`.
pub struct RollToNextOptionUseCase<D, A, S>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
{
    protocol: Arc<D>,
    auction: Arc<A>,
    selector: Arc<S>,
}

impl<D, A, S> RollToNextOptionUseCase<D, A, S>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
{
    /// Create a new `RollToNextOptionUseCase`.
    pub const fn new(protocol: Arc<D>, auction: Arc<A>, selector: Arc<S>) -> Self {
        Self {
            protocol,
            auction,
            selector,
        }
    }

    /// Roll into the committed series at `now`.
    pub async fn execute(&self, vault: &mut Vault, now: Timestamp) -> Result<RollSummary, RolloverError> {
        let series = vault.ensure_can_roll(now)?.clone();
        let round = vault.round();
        let collateral = vault.lockable_collateral()?;

        if collateral == 0 {
            vault.open_round(
                OpenRoundParams {
                    collateral: 0,
                    minted_supply: 0,
                    auction: None,
                },
                now,
            )?;
            return Ok(RollSummary {
                round,
                option_id: series.id,
                collateral: 0,
                minted_supply: 0,
                auction_id: None,
                min_price: None,
            });
        }

        let premium = self
            .selector
            .get_premium(series.strike, series.expiry, series.is_put)
            .await?;
        if premium <= Decimal::ZERO {
            return Err(RolloverError::invalid_response(
                "strike selector",
                format!("premium {premium} must be positive"),
            ));
        }
        let min_price = premium
            .checked_mul(vault.premium_discount().as_decimal())
            .ok_or_else(|| {
                RolloverError::invalid_response("strike selector", "premium out of range")
            })?;

        let opened = self
            .protocol
            .open_position(OpenPositionRequest {
                option_id: series.id.clone(),
                collateral,
                strike: series.strike,
                expiry: series.expiry,
                is_put: series.is_put,
            })
            .await?;
        if opened.option_id != series.id {
            return Err(RolloverError::invalid_response(
                "derivatives protocol",
                format!(
                    "opened series {} instead of committed {}",
                    opened.option_id, series.id
                ),
            ));
        }
        if opened.minted_supply == 0 {
            return Err(RolloverError::invalid_response(
                "derivatives protocol",
                "minted no supply",
            ));
        }

        let auction_id = match self
            .auction
            .open(AuctionRequest {
                option_id: series.id.clone(),
                sell_amount: opened.minted_supply,
                bidding_asset: vault.asset().to_string(),
                min_price,
                duration_secs: vault.auction_duration_secs(),
            })
            .await
        {
            Ok(auction_id) => auction_id,
            Err(e) => {
                self.unwind_position(&series.id, opened.minted_supply).await;
                return Err(e.into());
            }
        };

        vault.open_round(
            OpenRoundParams {
                collateral,
                minted_supply: opened.minted_supply,
                auction: Some(AuctionState {
                    id: auction_id.clone(),
                    supply: opened.minted_supply,
                    min_price,
                    outcome: None,
                }),
            },
            now,
        )?;

        Ok(RollSummary {
            round,
            option_id: series.id,
            collateral,
            minted_supply: opened.minted_supply,
            auction_id: Some(auction_id),
            min_price: Some(min_price),
        })
    }

    /// Burn supply minted for a roll that failed afterwards, returning its
    /// collateral so a retry mints against a clean position.
    async fn unwind_position(&self, option_id: &OptionId, minted_supply: u128) {
        match self.protocol.burn_options(option_id, minted_supply).await {
            Ok(released) => tracing::warn!(
                option_id = %option_id,
                minted_supply,
                released,
                "Unwound position after failed auction open"
            ),
            Err(e) => tracing::error!(
                option_id = %option_id,
                minted_supply,
                error = %e,
                "Failed to unwind position after failed auction open"
            ),
        }
    }
}
