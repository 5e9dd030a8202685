//! Vault construction and read-side queries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::settings::MIN_AUCTION_DURATION_SECS;
use crate::domain::shared::{AccountId, Rate, Timestamp};
use crate::domain::vault::entities::{
    DepositReceipt, RoundPriceHistory, ShareLedger, VaultState, Withdrawal,
};
use crate::domain::vault::errors::VaultError;
use crate::domain::vault::events::VaultEvent;
use crate::domain::vault::services::{PriceInputs, RolloverPhase, ShareMath, materialize};

/// Parameters for creating a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    /// Deposit asset symbol.
    pub asset: String,
    /// Underlying of the options written.
    pub underlying: String,
    /// Asset decimals.
    pub decimals: u8,
    /// Writes puts (true) or calls (false).
    pub is_put: bool,
    /// Deposit cap in base units.
    pub cap: u128,
    /// Minimum supply the first deposit must mint.
    pub minimum_supply: u128,
    /// Annual management fee.
    pub management_fee: Rate,
    /// Performance fee.
    pub performance_fee: Rate,
    /// Owner account.
    pub owner: AccountId,
    /// Keeper account.
    pub keeper: AccountId,
    /// Fee recipient.
    pub fee_recipient: AccountId,
    /// Discount applied to the premium to get the auction minimum price.
    pub premium_discount: Rate,
    /// Auction duration in seconds.
    pub auction_duration_secs: u64,
}

/// A single options vault: the ledger entities plus pending domain events.
#[derive(Debug, Clone)]
pub struct Vault {
    pub(super) asset: String,
    pub(super) underlying: String,
    pub(super) decimals: u8,
    pub(super) is_put: bool,
    pub(super) owner: AccountId,
    pub(super) keeper: AccountId,
    pub(super) fee_recipient: AccountId,
    pub(super) premium_discount: Rate,
    pub(super) auction_duration_secs: u64,
    pub(super) state: VaultState,
    pub(super) price_history: RoundPriceHistory,
    pub(super) receipts: BTreeMap<AccountId, DepositReceipt>,
    pub(super) withdrawals: BTreeMap<AccountId, Withdrawal>,
    pub(super) shares: ShareLedger,
    pub(super) events: Vec<VaultEvent>,
}

impl Vault {
    /// Create a vault at round 1.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported decimals, a zero cap, or an auction
    /// duration under five minutes.
    pub fn new(params: VaultParams) -> Result<Self, VaultError> {
        ShareMath::unit(params.decimals)?;
        if params.asset.trim().is_empty() {
            return Err(VaultError::InvalidSetting {
                setting: "asset",
                reason: "must not be empty".to_string(),
            });
        }
        if params.cap == 0 {
            return Err(VaultError::InvalidCap);
        }
        if params.auction_duration_secs < MIN_AUCTION_DURATION_SECS {
            return Err(VaultError::InvalidSetting {
                setting: "auction_duration",
                reason: format!("must be at least {MIN_AUCTION_DURATION_SECS} seconds"),
            });
        }

        Ok(Self {
            asset: params.asset,
            underlying: params.underlying,
            decimals: params.decimals,
            is_put: params.is_put,
            owner: params.owner,
            keeper: params.keeper,
            fee_recipient: params.fee_recipient,
            premium_discount: params.premium_discount,
            auction_duration_secs: params.auction_duration_secs,
            state: VaultState::new(
                params.cap,
                params.minimum_supply,
                params.management_fee,
                params.performance_fee,
            ),
            price_history: RoundPriceHistory::new(),
            receipts: BTreeMap::new(),
            withdrawals: BTreeMap::new(),
            shares: ShareLedger::new(),
            events: Vec::new(),
        })
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Deposit asset symbol.
    #[must_use]
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Underlying symbol.
    #[must_use]
    pub fn underlying(&self) -> &str {
        &self.underlying
    }

    /// Asset decimals.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Put or call vault.
    #[must_use]
    pub const fn is_put(&self) -> bool {
        self.is_put
    }

    /// Owner account.
    #[must_use]
    pub const fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Keeper account.
    #[must_use]
    pub const fn keeper(&self) -> &AccountId {
        &self.keeper
    }

    /// Fee recipient.
    #[must_use]
    pub const fn fee_recipient(&self) -> &AccountId {
        &self.fee_recipient
    }

    /// Auction price discount.
    #[must_use]
    pub const fn premium_discount(&self) -> Rate {
        self.premium_discount
    }

    /// Auction duration in seconds.
    #[must_use]
    pub const fn auction_duration_secs(&self) -> u64 {
        self.auction_duration_secs
    }

    /// Current round.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.state.round
    }

    /// Vault-wide accounting record.
    #[must_use]
    pub const fn state(&self) -> &VaultState {
        &self.state
    }

    /// Closing prices by round.
    #[must_use]
    pub const fn price_history(&self) -> &RoundPriceHistory {
        &self.price_history
    }

    /// Share balances.
    #[must_use]
    pub const fn share_ledger(&self) -> &ShareLedger {
        &self.shares
    }

    /// Stored receipt, as last written.
    #[must_use]
    pub fn receipt(&self, account: &AccountId) -> Option<&DepositReceipt> {
        self.receipts.get(account)
    }

    /// Open withdrawal.
    #[must_use]
    pub fn withdrawal(&self, account: &AccountId) -> Option<&Withdrawal> {
        self.withdrawals.get(account)
    }

    /// Rollover phase at `now`.
    #[must_use]
    pub fn rollover_phase(&self, now: Timestamp) -> RolloverPhase {
        RolloverPhase::at(&self.state, now)
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// Price-per-share if the round closed now, before fees.
    ///
    /// Informational only; nothing is ever settled at this price.
    pub fn current_price_per_share(&self) -> Result<u128, VaultError> {
        ShareMath::price_per_share(
            PriceInputs {
                total_balance: self.state.total_balance(),
                reserved_for_withdrawals: self.state.last_queued_withdraw_amount,
                total_pending: self.state.total_pending,
                total_supply: self.shares.total_supply(),
                priced_queued_shares: self.state.priced_queued_shares(),
            },
            self.decimals,
        )
    }

    /// Receipt with any stale pending amount converted to shares.
    pub fn materialized_receipt(&self, account: &AccountId) -> Result<DepositReceipt, VaultError> {
        self.receipts.get(account).map_or_else(
            || Ok(DepositReceipt::default()),
            |receipt| {
                materialize(
                    receipt,
                    &self.price_history,
                    self.state.round,
                    self.decimals,
                )
            },
        )
    }

    /// `(held, unredeemed)` shares of an account.
    pub fn share_balances(&self, account: &AccountId) -> Result<(u128, u128), VaultError> {
        let receipt = self.materialized_receipt(account)?;
        Ok((self.shares.balance_of(account), receipt.unredeemed_shares))
    }

    /// Asset value of an account at the informational price, including its
    /// pending deposit in the current round.
    pub fn account_vault_balance(&self, account: &AccountId) -> Result<u128, VaultError> {
        let receipt = self.materialized_receipt(account)?;
        let shares = self
            .shares
            .balance_of(account)
            .checked_add(receipt.unredeemed_shares)
            .ok_or(VaultError::overflow("account shares"))?;
        let pending = if receipt.round == self.state.round {
            receipt.amount
        } else {
            0
        };
        let value = if shares == 0 {
            0
        } else {
            ShareMath::shares_to_asset(shares, self.current_price_per_share()?, self.decimals)?
        };
        value
            .checked_add(pending)
            .ok_or(VaultError::overflow("account balance"))
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Drain accumulated domain events.
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get pending events without draining.
    #[must_use]
    pub fn pending_events(&self) -> &[VaultEvent] {
        &self.events
    }
}
