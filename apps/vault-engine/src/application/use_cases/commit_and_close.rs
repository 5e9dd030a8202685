//! Commit and Close Use Case
//!
//! Settles the expiring option, closes the round and commits the next
//! option series.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RolloverError;
use crate::application::ports::{DerivativesProtocolPort, SeriesRequest, StrikeSelectorPort};
use crate::domain::shared::Timestamp;
use crate::domain::vault::entities::OptionSeries;
use crate::domain::vault::services::next_expiry;
use crate::domain::vault::{CloseRoundParams, CloseSummary, Vault, VaultError};

/// Default wait between commit and roll (15 minutes).
pub const DEFAULT_DELAY_SECS: u64 = 900;

/// Rollover timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverSettings {
    /// Seconds between a commit and the earliest roll.
    pub delay_secs: u64,
}

impl Default for RolloverSettings {
    fn default() -> Self {
        Self {
            delay_secs: DEFAULT_DELAY_SECS,
        }
    }
}

/// Use case for `commit_and_close`.
pub struct CommitAndCloseUseCase<D, S>
where
    D: DerivativesProtocolPort,
    S: StrikeSelectorPort,
{
    protocol: Arc<D>,
    selector: Arc<S>,
    settings: RolloverSettings,
}

impl<D, S> CommitAndCloseUseCase<D, S>
where
    D: DerivativesProtocolPort,
    S: StrikeSelectorPort,
{
    /// Create a new `CommitAndCloseUseCase`.
    pub const fn new(protocol: Arc<D>, selector: Arc<S>, settings: RolloverSettings) -> Self {
        Self {
            protocol,
            selector,
            settings,
        }
    }

    /// Check that a commit may run at `now` and return the expiry of the
    /// current option, if any.
    ///
    /// Reads only, so callers can gate their own side effects on it.
    pub async fn ensure_expired(
        &self,
        vault: &Vault,
        now: Timestamp,
    ) -> Result<Option<Timestamp>, RolloverError> {
        vault.ensure_can_commit(now)?;
        let Some(option) = vault.state().current_option.as_ref() else {
            return Ok(None);
        };
        let expiry = self.protocol.expiry_of(&option.series.id).await?;
        if expiry > now {
            return Err(RolloverError::OptionNotExpired {
                option_id: option.series.id.to_string(),
                expiry: expiry.to_string(),
            });
        }
        Ok(Some(expiry))
    }

    /// Close the current round at `now` and commit the next option.
    ///
    /// The current option's auction must already be settled and its unsold
    /// supply burned.
    pub async fn execute(
        &self,
        vault: &mut Vault,
        now: Timestamp,
    ) -> Result<CloseSummary, RolloverError> {
        let current_expiry = self.ensure_expired(vault, now).await?;
        vault.ensure_auction_cleared()?;
        let current = vault.state().current_option.clone();

        let expiry =
            next_expiry(current_expiry, now).ok_or(VaultError::overflow("next expiry"))?;
        let is_put = vault.is_put();
        let (strike, overridden) = match vault.strike_override_for_round() {
            Some(strike) => (strike, true),
            None => (self.selector.get_strike_price(expiry, is_put).await?, false),
        };
        if strike <= Decimal::ZERO {
            return Err(VaultError::InvalidStrike {
                strike: strike.to_string(),
            }
            .into());
        }

        let option_id = self
            .protocol
            .get_or_create_series(SeriesRequest {
                strike,
                expiry,
                is_put,
            })
            .await?;

        let settlement_payout = match &current {
            Some(option) if option.outstanding_supply() > 0 => {
                let payout = self.protocol.settle_expired(&option.series.id).await?;
                let locked = vault.state().locked_amount;
                if payout > locked {
                    return Err(RolloverError::invalid_response(
                        "derivatives protocol",
                        format!("payout {payout} exceeds locked collateral {locked}"),
                    ));
                }
                Some(payout)
            }
            _ => None,
        };

        let summary = vault.close_round(CloseRoundParams {
            settlement_payout,
            next_option: OptionSeries {
                id: option_id,
                strike,
                expiry,
                is_put,
            },
            overridden,
            now,
            ready_at: now.plus_seconds(self.settings.delay_secs),
        })?;
        Ok(summary)
    }
}
