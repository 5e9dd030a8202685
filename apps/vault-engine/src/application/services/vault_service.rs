//! Vault Service
//!
//! Facade over a single vault. Every mutating call runs against a working
//! copy of the aggregate and replaces the stored vault only on success, so a
//! rejected call leaves no partial state behind. Domain events drained from
//! a successful call are handed to the event publisher afterwards.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::dto::{AccountSnapshotDto, RoundPriceDto, VaultSnapshotDto};
use crate::application::ports::{
    AuctionPort, AuctionSettlement, ClockPort, DerivativesProtocolPort, EventPublisherPort,
    StrikeSelectorPort,
};
use crate::application::use_cases::{
    AuctionSettlementUseCase, BurnSummary, CommitAndCloseUseCase, RollSummary,
    RollToNextOptionUseCase, RolloverError, RolloverSettings,
};
use crate::domain::shared::{AccountId, Timestamp};
use crate::domain::vault::{CloseSummary, Vault, VaultError, VaultEvent};

/// Role required by a facade operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Vault owner.
    Owner,
    /// Keeper bot.
    Keeper,
    /// Owner or keeper.
    OwnerOrKeeper,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Owner => "owner",
            Self::Keeper => "keeper",
            Self::OwnerOrKeeper => "owner or keeper",
        };
        write!(f, "{name}")
    }
}

/// Errors returned by the facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultServiceError {
    /// Vault rejected the operation.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Rollover failed.
    #[error(transparent)]
    Rollover(#[from] RolloverError),

    /// Caller lacks the required role.
    #[error("{caller} is not authorized; requires {required}")]
    Unauthorized {
        /// Calling account.
        caller: AccountId,
        /// Role required.
        required: Role,
    },
}

/// Facade owning one vault.
pub struct VaultService<D, A, S, C, E>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    vault: Mutex<Vault>,
    commit: CommitAndCloseUseCase<D, S>,
    roll: RollToNextOptionUseCase<D, A, S>,
    auction: AuctionSettlementUseCase<D, A>,
    clock: Arc<C>,
    publisher: Arc<E>,
}

impl<D, A, S, C, E> VaultService<D, A, S, C, E>
where
    D: DerivativesProtocolPort,
    A: AuctionPort,
    S: StrikeSelectorPort,
    C: ClockPort,
    E: EventPublisherPort,
{
    /// Create a new `VaultService`.
    pub fn new(
        vault: Vault,
        protocol: Arc<D>,
        auction: Arc<A>,
        selector: Arc<S>,
        clock: Arc<C>,
        publisher: Arc<E>,
        settings: RolloverSettings,
    ) -> Self {
        Self {
            vault: Mutex::new(vault),
            commit: CommitAndCloseUseCase::new(
                Arc::clone(&protocol),
                Arc::clone(&selector),
                settings,
            ),
            roll: RollToNextOptionUseCase::new(
                Arc::clone(&protocol),
                Arc::clone(&auction),
                selector,
            ),
            auction: AuctionSettlementUseCase::new(protocol, auction),
            clock,
            publisher,
        }
    }

    // =========================================================================
    // Deposits and withdrawals
    // =========================================================================

    /// Deposit for the caller.
    pub async fn deposit(&self, caller: &AccountId, amount: u128) -> Result<(), VaultServiceError> {
        self.deposit_for(caller, amount, caller).await
    }

    /// Deposit on behalf of `beneficiary`.
    pub async fn deposit_for(
        &self,
        caller: &AccountId,
        amount: u128,
        beneficiary: &AccountId,
    ) -> Result<(), VaultServiceError> {
        tracing::debug!(caller = %caller, beneficiary = %beneficiary, amount, "Deposit requested");
        self.apply("deposit", |vault| Ok(vault.deposit(beneficiary, amount)?))
            .await
    }

    /// Refund part of the caller's current-round deposit.
    pub async fn withdraw_instantly(
        &self,
        caller: &AccountId,
        amount: u128,
    ) -> Result<u128, VaultServiceError> {
        self.apply("withdraw_instantly", |vault| {
            Ok(vault.withdraw_instantly(caller, amount)?)
        })
        .await
    }

    /// Redeem `shares` unredeemed shares.
    pub async fn redeem(&self, caller: &AccountId, shares: u128) -> Result<u128, VaultServiceError> {
        self.apply("redeem", |vault| Ok(vault.redeem(caller, shares)?))
            .await
    }

    /// Redeem all unredeemed shares.
    pub async fn max_redeem(&self, caller: &AccountId) -> Result<u128, VaultServiceError> {
        self.apply("max_redeem", |vault| Ok(vault.max_redeem(caller)?))
            .await
    }

    /// Queue shares for withdrawal at this round's close.
    pub async fn initiate_withdraw(
        &self,
        caller: &AccountId,
        shares: u128,
    ) -> Result<(), VaultServiceError> {
        self.apply("initiate_withdraw", |vault| {
            Ok(vault.initiate_withdraw(caller, shares)?)
        })
        .await
    }

    /// Pay out a queued withdrawal.
    pub async fn complete_withdraw(&self, caller: &AccountId) -> Result<u128, VaultServiceError> {
        self.apply("complete_withdraw", |vault| {
            Ok(vault.complete_withdraw(caller)?)
        })
        .await
    }

    // =========================================================================
    // Rollover
    // =========================================================================

    /// Close the round and commit the next option.
    ///
    /// Once the current option has expired, an auction still open is settled
    /// and the supply it left unsold is burned before the position settles.
    /// Each of those steps is stored as soon as it succeeds, so a close that
    /// fails afterwards is retried without repeating them.
    pub async fn commit_and_close(
        &self,
        caller: &AccountId,
    ) -> Result<CloseSummary, VaultServiceError> {
        let now = self.clock.now();
        let mut events = Vec::new();
        let result = {
            let mut vault = self.vault.lock().await;
            authorize(&vault, caller, Role::OwnerOrKeeper)?;
            self.close_expired_round(&mut vault, now, &mut events).await
        };
        self.publish(events).await;
        result
    }

    /// Roll into the committed option.
    pub async fn roll_to_next_option(
        &self,
        caller: &AccountId,
    ) -> Result<RollSummary, VaultServiceError> {
        let now = self.clock.now();
        let (summary, events) = {
            let mut vault = self.vault.lock().await;
            authorize(&vault, caller, Role::Keeper)?;
            let mut working = vault.clone();
            let result = self.roll.execute(&mut working, now).await;
            swap_on_success("roll_to_next_option", &mut vault, working, result)?
        };
        self.publish(events).await;
        Ok(summary)
    }

    /// Settle the current option's auction.
    pub async fn settle_auction(
        &self,
        caller: &AccountId,
    ) -> Result<AuctionSettlement, VaultServiceError> {
        let (settlement, events) = {
            let mut vault = self.vault.lock().await;
            authorize(&vault, caller, Role::Keeper)?;
            let mut working = vault.clone();
            let result = self.auction.settle(&mut working).await;
            swap_on_success("settle_auction", &mut vault, working, result)?
        };
        self.publish(events).await;
        Ok(settlement)
    }

    /// Burn supply left unsold by the auction.
    pub async fn burn_remaining_options(
        &self,
        caller: &AccountId,
    ) -> Result<BurnSummary, VaultServiceError> {
        let (summary, events) = {
            let mut vault = self.vault.lock().await;
            authorize(&vault, caller, Role::Keeper)?;
            let mut working = vault.clone();
            let result = self.auction.burn_remaining(&mut working).await;
            swap_on_success("burn_remaining_options", &mut vault, working, result)?
        };
        self.publish(events).await;
        Ok(summary)
    }

    // =========================================================================
    // Owner settings
    // =========================================================================

    /// Set the deposit cap.
    pub async fn set_cap(&self, caller: &AccountId, cap: u128) -> Result<(), VaultServiceError> {
        self.apply("set_cap", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_cap(cap)?)
        })
        .await
    }

    /// Set the annual management fee.
    pub async fn set_management_fee(
        &self,
        caller: &AccountId,
        fee: Decimal,
    ) -> Result<(), VaultServiceError> {
        self.apply("set_management_fee", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_management_fee(fee)?)
        })
        .await
    }

    /// Set the performance fee.
    pub async fn set_performance_fee(
        &self,
        caller: &AccountId,
        fee: Decimal,
    ) -> Result<(), VaultServiceError> {
        self.apply("set_performance_fee", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_performance_fee(fee)?)
        })
        .await
    }

    /// Override the strike for this round's commit.
    pub async fn set_strike_price(
        &self,
        caller: &AccountId,
        strike: Decimal,
    ) -> Result<(), VaultServiceError> {
        self.apply("set_strike_price", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_strike_price(strike)?)
        })
        .await
    }

    /// Replace the keeper.
    pub async fn set_new_keeper(
        &self,
        caller: &AccountId,
        keeper: AccountId,
    ) -> Result<(), VaultServiceError> {
        self.apply("set_new_keeper", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_keeper(keeper)?)
        })
        .await
    }

    /// Replace the fee recipient.
    pub async fn set_fee_recipient(
        &self,
        caller: &AccountId,
        recipient: AccountId,
    ) -> Result<(), VaultServiceError> {
        self.apply("set_fee_recipient", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_fee_recipient(recipient)?)
        })
        .await
    }

    /// Set the auction price discount.
    pub async fn set_premium_discount(
        &self,
        caller: &AccountId,
        discount: Decimal,
    ) -> Result<(), VaultServiceError> {
        self.apply("set_premium_discount", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_premium_discount(discount)?)
        })
        .await
    }

    /// Set the auction duration.
    pub async fn set_auction_duration(
        &self,
        caller: &AccountId,
        duration_secs: u64,
    ) -> Result<(), VaultServiceError> {
        self.apply("set_auction_duration", |vault| {
            authorize(vault, caller, Role::Owner)?;
            Ok(vault.set_auction_duration(duration_secs)?)
        })
        .await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Vault-wide view.
    pub async fn snapshot(&self) -> Result<VaultSnapshotDto, VaultServiceError> {
        let vault = self.vault.lock().await;
        Ok(VaultSnapshotDto::from_vault(&vault, self.clock.now())?)
    }

    /// Every recorded round price.
    pub async fn round_prices(&self) -> Vec<RoundPriceDto> {
        let vault = self.vault.lock().await;
        vault
            .price_history()
            .iter()
            .map(|(round, price_per_share)| RoundPriceDto {
                round,
                price_per_share,
            })
            .collect()
    }

    /// Price recorded for `round`.
    pub async fn price_at(&self, round: u64) -> Result<RoundPriceDto, VaultServiceError> {
        let vault = self.vault.lock().await;
        let price_per_share = vault.price_history().require(round)?;
        Ok(RoundPriceDto {
            round,
            price_per_share,
        })
    }

    /// Per-account view.
    pub async fn account(&self, account: &AccountId) -> Result<AccountSnapshotDto, VaultServiceError> {
        let vault = self.vault.lock().await;
        Ok(AccountSnapshotDto::from_vault(&vault, account)?)
    }

    /// Run a read-only closure against the vault.
    pub async fn read<T>(&self, f: impl FnOnce(&Vault) -> T) -> T {
        let vault = self.vault.lock().await;
        f(&vault)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn apply<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Vault) -> Result<T, VaultServiceError>,
    ) -> Result<T, VaultServiceError> {
        let (value, events) = {
            let mut vault = self.vault.lock().await;
            let mut working = vault.clone();
            let result = f(&mut working);
            swap_on_success(operation, &mut vault, working, result)?
        };
        self.publish(events).await;
        Ok(value)
    }

    async fn close_expired_round(
        &self,
        vault: &mut Vault,
        now: Timestamp,
        events: &mut Vec<VaultEvent>,
    ) -> Result<CloseSummary, VaultServiceError> {
        const OPERATION: &str = "commit_and_close";

        if let Err(e) = self.commit.ensure_expired(vault, now).await {
            return Err(rejected(OPERATION, e));
        }

        if vault.pending_auction().is_ok() {
            let mut working = vault.clone();
            let result = self.auction.settle(&mut working).await;
            let (settlement, settled) = swap_on_success(OPERATION, vault, working, result)?;
            tracing::info!(
                proceeds = settlement.proceeds,
                unsold_supply = settlement.unsold_supply,
                "Settled open auction before close"
            );
            events.extend(settled);
        }

        if vault.burnable_supply().is_ok() {
            let mut working = vault.clone();
            let result = self.auction.burn_remaining(&mut working).await;
            let (burn, burned) = swap_on_success(OPERATION, vault, working, result)?;
            tracing::info!(
                burned_supply = burn.burned_supply,
                released_collateral = burn.released_collateral,
                "Burned unsold options before close"
            );
            events.extend(burned);
        }

        let mut working = vault.clone();
        let result = self.commit.execute(&mut working, now).await;
        let (summary, closed) = swap_on_success(OPERATION, vault, working, result)?;
        events.extend(closed);
        Ok(summary)
    }

    async fn publish(&self, events: Vec<VaultEvent>) {
        if events.is_empty() {
            return;
        }
        let count = events.len();
        if let Err(e) = self.publisher.publish(events).await {
            tracing::error!(error = %e, count, "Failed to publish vault events");
        }
    }
}

fn authorize(vault: &Vault, caller: &AccountId, required: Role) -> Result<(), VaultServiceError> {
    let allowed = match required {
        Role::Owner => caller == vault.owner(),
        Role::Keeper => caller == vault.keeper(),
        Role::OwnerOrKeeper => caller == vault.owner() || caller == vault.keeper(),
    };
    if allowed {
        Ok(())
    } else {
        tracing::warn!(caller = %caller, %required, "Unauthorized vault call");
        Err(VaultServiceError::Unauthorized {
            caller: caller.clone(),
            required,
        })
    }
}

fn swap_on_success<T, Err>(
    operation: &'static str,
    stored: &mut Vault,
    mut working: Vault,
    result: Result<T, Err>,
) -> Result<(T, Vec<VaultEvent>), VaultServiceError>
where
    Err: Into<VaultServiceError>,
{
    match result {
        Ok(value) => {
            let events = working.drain_events();
            *stored = working;
            Ok((value, events))
        }
        Err(e) => Err(rejected(operation, e)),
    }
}

fn rejected<Err>(operation: &'static str, error: Err) -> VaultServiceError
where
    Err: Into<VaultServiceError>,
{
    let error = error.into();
    tracing::warn!(operation, error = %error, "Vault operation rejected");
    error
}
