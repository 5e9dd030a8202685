//! Vault DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, Timestamp};
use crate::domain::vault::Vault;
use crate::domain::vault::entities::{
    ActiveOption, AuctionOutcome, DepositReceipt, OptionSeries, Withdrawal,
};
use crate::domain::vault::errors::VaultError;
use crate::domain::vault::services::RolloverPhase;

/// The option the vault is short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOptionDto {
    /// Series.
    pub series: OptionSeries,
    /// Collateral locked at the roll.
    pub collateral: u128,
    /// Supply minted.
    pub minted_supply: u128,
    /// Supply burned.
    pub burned_supply: u128,
    /// Auction identifier.
    pub auction_id: Option<String>,
    /// Auction minimum price.
    pub auction_min_price: Option<Decimal>,
    /// Auction result, once settled.
    pub auction_outcome: Option<AuctionOutcome>,
}

impl ActiveOptionDto {
    /// Convert from the domain entity.
    #[must_use]
    pub fn from_option(option: &ActiveOption) -> Self {
        Self {
            series: option.series.clone(),
            collateral: option.collateral,
            minted_supply: option.minted_supply,
            burned_supply: option.burned_supply,
            auction_id: option.auction.as_ref().map(|a| a.id.to_string()),
            auction_min_price: option.auction.as_ref().map(|a| a.min_price),
            auction_outcome: option.auction.as_ref().and_then(|a| a.outcome),
        }
    }
}

/// Vault-wide view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshotDto {
    /// Deposit asset.
    pub asset: String,
    /// Underlying.
    pub underlying: String,
    /// Asset decimals.
    pub decimals: u8,
    /// Put or call vault.
    pub is_put: bool,
    /// Current round.
    pub round: u64,
    /// Rollover phase.
    pub phase: RolloverPhase,
    /// Free plus locked.
    pub total_balance: u128,
    /// Unlocked asset.
    pub free_balance: u128,
    /// Asset locked in the current option.
    pub locked_amount: u128,
    /// Performance fee baseline.
    pub last_locked_amount: u128,
    /// Current-round deposits.
    pub total_pending: u128,
    /// Unpaid queued shares.
    pub queued_withdraw_shares: u128,
    /// Shares queued in the current round.
    pub current_queued_withdraw_shares: u128,
    /// Asset reserved for priced withdrawals.
    pub last_queued_withdraw_amount: u128,
    /// Total share supply.
    pub total_supply: u128,
    /// Informational price-per-share if the round closed now.
    pub price_per_share: u128,
    /// Deposit cap.
    pub cap: u128,
    /// Minimum first-deposit supply.
    pub minimum_supply: u128,
    /// Annual management fee.
    pub management_fee: Decimal,
    /// Performance fee.
    pub performance_fee: Decimal,
    /// Auction price discount.
    pub premium_discount: Decimal,
    /// Auction duration.
    pub auction_duration_secs: u64,
    /// Current option.
    pub current_option: Option<ActiveOptionDto>,
    /// Committed next option.
    pub next_option: Option<OptionSeries>,
    /// Earliest roll time.
    pub next_option_ready_at: Option<Timestamp>,
    /// Last close.
    pub last_round_closed_at: Option<Timestamp>,
    /// Owner.
    pub owner: AccountId,
    /// Keeper.
    pub keeper: AccountId,
    /// Fee recipient.
    pub fee_recipient: AccountId,
}

impl VaultSnapshotDto {
    /// Build from the aggregate at `now`.
    pub fn from_vault(vault: &Vault, now: Timestamp) -> Result<Self, VaultError> {
        let state = vault.state();
        Ok(Self {
            asset: vault.asset().to_string(),
            underlying: vault.underlying().to_string(),
            decimals: vault.decimals(),
            is_put: vault.is_put(),
            round: state.round,
            phase: vault.rollover_phase(now),
            total_balance: state.total_balance(),
            free_balance: state.free_balance,
            locked_amount: state.locked_amount,
            last_locked_amount: state.last_locked_amount,
            total_pending: state.total_pending,
            queued_withdraw_shares: state.queued_withdraw_shares,
            current_queued_withdraw_shares: state.current_queued_withdraw_shares,
            last_queued_withdraw_amount: state.last_queued_withdraw_amount,
            total_supply: vault.share_ledger().total_supply(),
            price_per_share: vault.current_price_per_share()?,
            cap: state.cap,
            minimum_supply: state.minimum_supply,
            management_fee: state.management_fee.as_decimal(),
            performance_fee: state.performance_fee.as_decimal(),
            premium_discount: vault.premium_discount().as_decimal(),
            auction_duration_secs: vault.auction_duration_secs(),
            current_option: state.current_option.as_ref().map(ActiveOptionDto::from_option),
            next_option: state.next_option.clone(),
            next_option_ready_at: state.next_option_ready_at,
            last_round_closed_at: state.last_round_closed_at,
            owner: vault.owner().clone(),
            keeper: vault.keeper().clone(),
            fee_recipient: vault.fee_recipient().clone(),
        })
    }
}

/// Closing price of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPriceDto {
    /// Round.
    pub round: u64,
    /// Price-per-share.
    pub price_per_share: u128,
}

/// Per-account view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshotDto {
    /// Account.
    pub account: AccountId,
    /// Shares in the account's own balance.
    pub held_shares: u128,
    /// Shares the vault holds for the account.
    pub unredeemed_shares: u128,
    /// Receipt, with stale pending amounts converted.
    pub receipt: DepositReceipt,
    /// Open withdrawal.
    pub withdrawal: Option<Withdrawal>,
    /// Asset value at the informational price plus current-round pending.
    pub vault_balance: u128,
}

impl AccountSnapshotDto {
    /// Build from the aggregate.
    pub fn from_vault(vault: &Vault, account: &AccountId) -> Result<Self, VaultError> {
        let (held_shares, unredeemed_shares) = vault.share_balances(account)?;
        Ok(Self {
            account: account.clone(),
            held_shares,
            unredeemed_shares,
            receipt: vault.materialized_receipt(account)?,
            withdrawal: vault.withdrawal(account).copied(),
            vault_balance: vault.account_vault_balance(account)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Rate;
    use crate::domain::vault::VaultParams;
    use rust_decimal_macros::dec;

    fn vault() -> Vault {
        Vault::new(VaultParams {
            asset: "USDC".to_string(),
            underlying: "WETH".to_string(),
            decimals: 6,
            is_put: true,
            cap: 1_000_000_000_000,
            minimum_supply: 10_000,
            management_fee: Rate::fee(dec!(0.02)).unwrap(),
            performance_fee: Rate::fee(dec!(0.10)).unwrap(),
            owner: AccountId::new("owner"),
            keeper: AccountId::new("keeper"),
            fee_recipient: AccountId::new("treasury"),
            premium_discount: Rate::discount(dec!(0.95)).unwrap(),
            auction_duration_secs: 3_600,
        })
        .unwrap()
    }

    #[test]
    fn snapshot_of_new_vault() {
        let snapshot = VaultSnapshotDto::from_vault(&vault(), Timestamp::now()).unwrap();
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.phase, RolloverPhase::Idle);
        assert_eq!(snapshot.price_per_share, 1_000_000);
        assert_eq!(snapshot.management_fee, dec!(0.02));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["phase"], "IDLE");
        assert_eq!(json["keeper"], "keeper");
    }

    #[test]
    fn account_snapshot_counts_pending_deposit() {
        let mut vault = vault();
        let alice = AccountId::new("alice");
        vault.deposit(&alice, 5_000_000).unwrap();

        let snapshot = AccountSnapshotDto::from_vault(&vault, &alice).unwrap();
        assert_eq!(snapshot.receipt.amount, 5_000_000);
        assert_eq!(snapshot.vault_balance, 5_000_000);
        assert_eq!(snapshot.held_shares, 0);
        assert!(snapshot.withdrawal.is_none());
    }
}
