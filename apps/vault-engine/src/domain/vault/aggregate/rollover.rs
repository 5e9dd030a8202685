//! Round close and option rollover on the aggregate.
//!
//! The aggregate never talks to collaborators. Use cases fetch strikes,
//! payouts and auction results first, validate them, and pass them in here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Vault;
use crate::domain::shared::{AuctionId, OptionId, Rate, Timestamp};
use crate::domain::vault::entities::{ActiveOption, AuctionOutcome, AuctionState, OptionSeries};
use crate::domain::vault::errors::VaultError;
use crate::domain::vault::events::{
    AuctionSettled, AuctionStarted, NewOptionStrikeSelected, OptionsBurned, RoundClosed,
    ShortClosed, ShortOpened, VaultEvent, VaultFeesCollected,
};
use crate::domain::vault::services::{
    FeeCalculator, FeeInputs, PriceInputs, RolloverPhase, RolloverStateMachine, ShareMath,
    VaultFees,
};

/// Inputs gathered by `commit_and_close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRoundParams {
    /// Payout of the expiring position, when it had outstanding supply.
    pub settlement_payout: Option<u128>,
    /// Series committed for the next round.
    pub next_option: OptionSeries,
    /// Whether the strike came from the owner override.
    pub overridden: bool,
    /// Close time.
    pub now: Timestamp,
    /// Earliest roll time for the committed series.
    pub ready_at: Timestamp,
}

/// Result of a round close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseSummary {
    /// Round that closed.
    pub closed_round: u64,
    /// Price-per-share recorded for it.
    pub price_per_share: u128,
    /// Fees charged.
    pub fees: VaultFees,
    /// Shares minted for pending deposits.
    pub minted_shares: u128,
    /// Asset reserved for queued withdrawals after the close.
    pub queued_withdraw_amount: u128,
}

/// Inputs gathered by `roll_to_next_option`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRoundParams {
    /// Collateral to lock.
    pub collateral: u128,
    /// Supply minted by the protocol.
    pub minted_supply: u128,
    /// Auction of the minted supply.
    pub auction: Option<AuctionState>,
}

impl Vault {
    // =========================================================================
    // Commit and close
    // =========================================================================

    /// Check that a commit is allowed at `now`.
    ///
    /// # Errors
    ///
    /// `NextOptionPending` while an option is already committed.
    pub fn ensure_can_commit(&self, now: Timestamp) -> Result<(), VaultError> {
        RolloverStateMachine::validate_transition(self.rollover_phase(now), RolloverPhase::ReadyDelay)
    }

    /// Check that the current option's auction has nothing left for the vault
    /// to collect.
    ///
    /// # Errors
    ///
    /// `AuctionNotSettled` while the auction is open, `UnsoldSupplyNotBurned`
    /// while the vault still holds supply the auction did not sell.
    pub fn ensure_auction_cleared(&self) -> Result<(), VaultError> {
        let Some(auction) = self
            .state
            .current_option
            .as_ref()
            .and_then(|o| o.auction.as_ref())
        else {
            return Ok(());
        };
        match auction.outcome {
            None => Err(VaultError::AuctionNotSettled),
            Some(outcome) if !outcome.burned && outcome.unsold_supply > 0 => {
                Err(VaultError::UnsoldSupplyNotBurned {
                    supply: outcome.unsold_supply,
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Owner strike override, if it was set in the current round.
    #[must_use]
    pub fn strike_override_for_round(&self) -> Option<Decimal> {
        self.state
            .strike_override
            .filter(|o| o.round == self.state.round)
            .map(|o| o.strike)
    }

    /// Settle the expiring position, charge fees, price the round and commit
    /// the next option.
    ///
    /// # Errors
    ///
    /// Phase errors, an open auction or unburned unsold supply, an unsettled
    /// position with outstanding supply, a payout above the locked collateral,
    /// or an unusable round price.
    pub fn close_round(&mut self, params: CloseRoundParams) -> Result<CloseSummary, VaultError> {
        self.ensure_can_commit(params.now)?;
        self.ensure_auction_cleared()?;
        if params.next_option.strike <= Decimal::ZERO {
            return Err(VaultError::InvalidStrike {
                strike: params.next_option.strike.to_string(),
            });
        }

        let round = self.state.round;
        let mut free_balance = self.state.free_balance;
        let mut last_locked_amount = self.state.last_locked_amount;
        let mut performance_fee = Rate::ZERO;
        let mut short_closed = None;

        if let Some(current) = &self.state.current_option {
            let locked = self.state.locked_amount;
            let payout = match params.settlement_payout {
                Some(payout) => payout,
                None if current.outstanding_supply() == 0 => locked,
                None => {
                    return Err(VaultError::InvariantViolation(format!(
                        "option {} has outstanding supply but was not settled",
                        current.series.id
                    )));
                }
            };
            if payout > locked {
                return Err(VaultError::InvariantViolation(format!(
                    "payout {payout} exceeds locked collateral {locked}"
                )));
            }
            if current.collateral > 0 {
                last_locked_amount = current.collateral;
                performance_fee = self.state.performance_fee;
            }
            free_balance = free_balance
                .checked_add(payout)
                .ok_or(VaultError::overflow("free balance"))?;
            short_closed = Some(ShortClosed {
                option_id: current.series.id.clone(),
                locked_amount: locked,
                payout,
                round,
            });
        }

        let elapsed_seconds = self
            .state
            .last_round_closed_at
            .map_or(0, |closed_at| params.now.seconds_since(closed_at));
        let fees = FeeCalculator::calculate(&FeeInputs {
            total_balance: free_balance,
            last_queued_withdraw_amount: self.state.last_queued_withdraw_amount,
            total_pending: self.state.total_pending,
            last_locked_amount,
            management_fee: self.state.management_fee,
            performance_fee,
            elapsed_seconds,
        })?;
        let free_balance = free_balance
            .checked_sub(fees.total())
            .ok_or_else(|| VaultError::underflow("free balance"))?;

        let price_per_share = ShareMath::price_per_share(
            PriceInputs {
                total_balance: free_balance,
                reserved_for_withdrawals: self.state.last_queued_withdraw_amount,
                total_pending: self.state.total_pending,
                total_supply: self.shares.total_supply(),
                priced_queued_shares: self.state.priced_queued_shares(),
            },
            self.decimals,
        )?;

        let newly_reserved = match self.state.current_queued_withdraw_shares {
            0 => 0,
            shares => ShareMath::shares_to_asset(shares, price_per_share, self.decimals)?,
        };
        let queued_withdraw_amount = self
            .state
            .last_queued_withdraw_amount
            .checked_add(newly_reserved)
            .ok_or(VaultError::overflow("queued withdraw amount"))?;
        let minted_shares = match self.state.total_pending {
            0 => 0,
            pending => ShareMath::asset_to_shares(pending, price_per_share, self.decimals)?,
        };
        let next_round = round
            .checked_add(1)
            .ok_or(VaultError::overflow("round"))?;

        self.price_history.record(round, price_per_share)?;
        if minted_shares > 0 {
            self.shares.mint_to_vault(minted_shares)?;
        }

        self.state.free_balance = free_balance;
        self.state.locked_amount = 0;
        self.state.last_locked_amount = last_locked_amount;
        self.state.last_queued_withdraw_amount = queued_withdraw_amount;
        self.state.current_queued_withdraw_shares = 0;
        self.state.total_pending = 0;
        self.state.round = next_round;
        self.state.last_round_closed_at = Some(params.now);
        self.state.current_option = None;
        self.state.strike_override = None;
        self.state.next_option = Some(params.next_option.clone());
        self.state.next_option_ready_at = Some(params.ready_at);

        tracing::info!(
            round,
            price_per_share,
            minted_shares,
            performance_fee = fees.performance_fee,
            management_fee = fees.management_fee,
            next_option = %params.next_option.id,
            "Round closed"
        );

        if let Some(event) = short_closed {
            self.events.push(VaultEvent::ShortClosed(event));
        }
        self.events
            .push(VaultEvent::VaultFeesCollected(VaultFeesCollected {
                round,
                performance_fee: fees.performance_fee,
                management_fee: fees.management_fee,
                recipient: self.fee_recipient.clone(),
            }));
        self.events.push(VaultEvent::RoundClosed(RoundClosed {
            round,
            price_per_share,
            minted_shares,
            queued_withdraw_amount,
            closed_at: params.now,
        }));
        self.events
            .push(VaultEvent::NewOptionStrikeSelected(NewOptionStrikeSelected {
                round: next_round,
                option_id: params.next_option.id,
                strike: params.next_option.strike,
                expiry: params.next_option.expiry,
                overridden: params.overridden,
            }));

        Ok(CloseSummary {
            closed_round: round,
            price_per_share,
            fees,
            minted_shares,
            queued_withdraw_amount,
        })
    }

    // =========================================================================
    // Roll
    // =========================================================================

    /// The committed series, if it may be rolled into at `now`.
    ///
    /// # Errors
    ///
    /// `NotReady` during the delay, `NoNextOptionPending` when nothing is
    /// committed.
    pub fn ensure_can_roll(&self, now: Timestamp) -> Result<&OptionSeries, VaultError> {
        let phase = self.rollover_phase(now);
        if phase == RolloverPhase::ReadyDelay {
            return Err(VaultError::NotReady {
                ready_at: self
                    .state
                    .next_option_ready_at
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
            });
        }
        RolloverStateMachine::validate_transition(phase, RolloverPhase::Active)?;
        self.state
            .next_option
            .as_ref()
            .ok_or(VaultError::NoNextOptionPending)
    }

    /// Free balance not reserved for withdrawals or pending deposits.
    pub fn lockable_collateral(&self) -> Result<u128, VaultError> {
        self.state
            .free_balance
            .checked_sub(self.state.last_queued_withdraw_amount)
            .and_then(|v| v.checked_sub(self.state.total_pending))
            .ok_or_else(|| VaultError::underflow("lockable collateral"))
    }

    /// Make the committed series current and lock its collateral.
    ///
    /// # Errors
    ///
    /// Phase errors, collateral above the lockable amount, or a minted supply
    /// and auction that do not match the collateral.
    pub fn open_round(&mut self, params: OpenRoundParams, now: Timestamp) -> Result<(), VaultError> {
        let series = self.ensure_can_roll(now)?.clone();

        let lockable = self.lockable_collateral()?;
        if params.collateral > lockable {
            return Err(VaultError::InvariantViolation(format!(
                "collateral {} exceeds lockable balance {lockable}",
                params.collateral
            )));
        }
        let has_position = params.collateral > 0;
        if has_position != (params.minted_supply > 0) || has_position != params.auction.is_some() {
            return Err(VaultError::InvariantViolation(
                "collateral, minted supply and auction must all be present or all absent"
                    .to_string(),
            ));
        }
        if let Some(auction) = &params.auction
            && auction.supply != params.minted_supply
        {
            return Err(VaultError::InvariantViolation(format!(
                "auction supply {} differs from minted supply {}",
                auction.supply, params.minted_supply
            )));
        }

        let round = self.state.round;
        self.state.free_balance = self.state.free_balance - params.collateral;
        self.state.locked_amount = params.collateral;
        self.state.next_option = None;
        self.state.next_option_ready_at = None;
        self.state.current_option = Some(ActiveOption {
            series: series.clone(),
            collateral: params.collateral,
            minted_supply: params.minted_supply,
            burned_supply: 0,
            auction: params.auction.clone(),
        });

        if has_position {
            tracing::info!(
                round,
                option_id = %series.id,
                collateral = params.collateral,
                minted_supply = params.minted_supply,
                "Rolled to next option"
            );
        } else {
            tracing::warn!(round, option_id = %series.id, "Rolled with no collateral to lock");
        }

        self.events.push(VaultEvent::ShortOpened(ShortOpened {
            round,
            option_id: series.id.clone(),
            collateral: params.collateral,
            minted_supply: params.minted_supply,
        }));
        if let Some(auction) = params.auction {
            self.events.push(VaultEvent::AuctionStarted(AuctionStarted {
                round,
                auction_id: auction.id,
                option_id: series.id,
                supply: auction.supply,
                min_price: auction.min_price,
            }));
        }
        Ok(())
    }

    // =========================================================================
    // Auction settlement and burn
    // =========================================================================

    /// The open, unsettled auction of the current option.
    ///
    /// # Errors
    ///
    /// `NoActiveOption`, `AuctionNotOpen`, or `AuctionAlreadySettled`.
    pub fn pending_auction(&self) -> Result<&AuctionState, VaultError> {
        let current = self
            .state
            .current_option
            .as_ref()
            .ok_or(VaultError::NoActiveOption)?;
        let auction = current.auction.as_ref().ok_or(VaultError::AuctionNotOpen)?;
        if auction.outcome.is_some() {
            return Err(VaultError::AuctionAlreadySettled);
        }
        Ok(auction)
    }

    /// Record the auction result and credit its proceeds.
    pub fn record_auction_settlement(
        &mut self,
        proceeds: u128,
        unsold_supply: u128,
    ) -> Result<(), VaultError> {
        let auction = self.pending_auction()?;
        if unsold_supply > auction.supply {
            return Err(VaultError::InvariantViolation(format!(
                "unsold supply {unsold_supply} exceeds auctioned supply {}",
                auction.supply
            )));
        }
        let auction_id: AuctionId = auction.id.clone();
        let free_balance = self
            .state
            .free_balance
            .checked_add(proceeds)
            .ok_or(VaultError::overflow("free balance"))?;

        let round = self.state.round;
        self.state.free_balance = free_balance;
        if let Some(auction) = self
            .state
            .current_option
            .as_mut()
            .and_then(|o| o.auction.as_mut())
        {
            auction.outcome = Some(AuctionOutcome {
                proceeds,
                unsold_supply,
                burned: unsold_supply == 0,
            });
        }

        tracing::info!(round, auction_id = %auction_id, proceeds, unsold_supply, "Auction settled");
        self.events.push(VaultEvent::AuctionSettled(AuctionSettled {
            round,
            auction_id,
            proceeds,
            unsold_supply,
        }));
        Ok(())
    }

    /// Series and supply left unsold by a settled auction.
    ///
    /// # Errors
    ///
    /// `NoActiveOption`, `AuctionNotSettled`, or `NothingToBurn`.
    pub fn burnable_supply(&self) -> Result<(OptionId, u128), VaultError> {
        let current = self
            .state
            .current_option
            .as_ref()
            .ok_or(VaultError::NoActiveOption)?;
        let auction = current.auction.as_ref().ok_or(VaultError::NothingToBurn)?;
        let outcome = auction.outcome.ok_or(VaultError::AuctionNotSettled)?;
        if outcome.burned || outcome.unsold_supply == 0 {
            return Err(VaultError::NothingToBurn);
        }
        Ok((current.series.id.clone(), outcome.unsold_supply))
    }

    /// Record the burn of the unsold supply and release its collateral.
    pub fn record_options_burned(&mut self, released_collateral: u128) -> Result<(), VaultError> {
        let (option_id, burned_supply) = self.burnable_supply()?;
        let locked = self.state.locked_amount;
        if released_collateral > locked {
            return Err(VaultError::InvariantViolation(format!(
                "released collateral {released_collateral} exceeds locked collateral {locked}"
            )));
        }
        let free_balance = self
            .state
            .free_balance
            .checked_add(released_collateral)
            .ok_or(VaultError::overflow("free balance"))?;

        let round = self.state.round;
        self.state.locked_amount = locked - released_collateral;
        self.state.free_balance = free_balance;
        if let Some(current) = self.state.current_option.as_mut() {
            current.burned_supply = current.burned_supply.saturating_add(burned_supply);
            if let Some(outcome) = current.auction.as_mut().and_then(|a| a.outcome.as_mut()) {
                outcome.burned = true;
            }
        }

        tracing::info!(
            round,
            option_id = %option_id,
            burned_supply,
            released_collateral,
            "Unsold options burned"
        );
        self.events.push(VaultEvent::OptionsBurned(OptionsBurned {
            round,
            option_id,
            burned_supply,
            released_collateral,
        }));
        Ok(())
    }
}

#[cfg(test)]
impl Vault {
    /// Close the round and roll into an option with nothing locked.
    pub(crate) fn close_round_for_test(&mut self) -> Result<CloseSummary, VaultError> {
        use super::vault::test_support::{WEEK, start};
        use rust_decimal_macros::dec;

        let now = self
            .state
            .last_round_closed_at
            .map_or_else(start, |t| t.plus_seconds(WEEK));
        let series = OptionSeries {
            id: OptionId::new(format!("opt-{}", self.state.round)),
            strike: dec!(1000),
            expiry: now.plus_seconds(WEEK),
            is_put: self.is_put,
        };
        let summary = self.close_round(CloseRoundParams {
            settlement_payout: None,
            next_option: series,
            overridden: false,
            now,
            ready_at: now,
        })?;
        self.open_round(
            OpenRoundParams {
                collateral: 0,
                minted_supply: 0,
                auction: None,
            },
            now,
        )?;
        Ok(summary)
    }
}
