//! Domain events for the vault ledger.
//!
//! Events are accumulated on the aggregate and drained by the facade after a
//! successful operation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{AccountId, AuctionId, OptionId, Timestamp};

/// All vault events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultEvent {
    /// Asset deposited for the current round.
    Deposited(Deposited),
    /// Pending deposit refunded before the round closed.
    InstantWithdrawn(InstantWithdrawn),
    /// Unredeemed shares moved to the depositor.
    Redeemed(Redeemed),
    /// Shares queued for withdrawal.
    WithdrawalInitiated(WithdrawalInitiated),
    /// Queued withdrawal paid out.
    WithdrawalCompleted(WithdrawalCompleted),
    /// Expiring position settled.
    ShortClosed(ShortClosed),
    /// Fees taken at a round close.
    VaultFeesCollected(VaultFeesCollected),
    /// Round closed and priced.
    RoundClosed(RoundClosed),
    /// Next option committed.
    NewOptionStrikeSelected(NewOptionStrikeSelected),
    /// Collateral locked into a new position.
    ShortOpened(ShortOpened),
    /// Minted supply offered at auction.
    AuctionStarted(AuctionStarted),
    /// Auction result folded into the ledger.
    AuctionSettled(AuctionSettled),
    /// Unsold supply burned and collateral released.
    OptionsBurned(OptionsBurned),
    /// Owner changed a vault setting.
    SettingChanged(SettingChanged),
}

impl VaultEvent {
    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Deposited(_) => "DEPOSITED",
            Self::InstantWithdrawn(_) => "INSTANT_WITHDRAWN",
            Self::Redeemed(_) => "REDEEMED",
            Self::WithdrawalInitiated(_) => "WITHDRAWAL_INITIATED",
            Self::WithdrawalCompleted(_) => "WITHDRAWAL_COMPLETED",
            Self::ShortClosed(_) => "SHORT_CLOSED",
            Self::VaultFeesCollected(_) => "VAULT_FEES_COLLECTED",
            Self::RoundClosed(_) => "ROUND_CLOSED",
            Self::NewOptionStrikeSelected(_) => "NEW_OPTION_STRIKE_SELECTED",
            Self::ShortOpened(_) => "SHORT_OPENED",
            Self::AuctionStarted(_) => "AUCTION_STARTED",
            Self::AuctionSettled(_) => "AUCTION_SETTLED",
            Self::OptionsBurned(_) => "OPTIONS_BURNED",
            Self::SettingChanged(_) => "SETTING_CHANGED",
        }
    }

    /// Round the event belongs to.
    #[must_use]
    pub const fn round(&self) -> u64 {
        match self {
            Self::Deposited(e) => e.round,
            Self::InstantWithdrawn(e) => e.round,
            Self::Redeemed(e) => e.round,
            Self::WithdrawalInitiated(e) => e.round,
            Self::WithdrawalCompleted(e) => e.round,
            Self::ShortClosed(e) => e.round,
            Self::VaultFeesCollected(e) => e.round,
            Self::RoundClosed(e) => e.round,
            Self::NewOptionStrikeSelected(e) => e.round,
            Self::ShortOpened(e) => e.round,
            Self::AuctionStarted(e) => e.round,
            Self::AuctionSettled(e) => e.round,
            Self::OptionsBurned(e) => e.round,
            Self::SettingChanged(e) => e.round,
        }
    }
}

/// Event: deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    /// Account credited with the deposit.
    pub account: AccountId,
    /// Asset amount.
    pub amount: u128,
    /// Round the deposit joins.
    pub round: u64,
}

/// Event: instant withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantWithdrawn {
    /// Account refunded.
    pub account: AccountId,
    /// Asset amount.
    pub amount: u128,
    /// Current round.
    pub round: u64,
}

/// Event: shares redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeemed {
    /// Account receiving shares.
    pub account: AccountId,
    /// Shares redeemed.
    pub shares: u128,
    /// Current round.
    pub round: u64,
}

/// Event: withdrawal initiated or topped up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalInitiated {
    /// Withdrawing account.
    pub account: AccountId,
    /// Shares added to the queue by this call.
    pub shares: u128,
    /// Round the withdrawal will be priced at.
    pub round: u64,
}

/// Event: withdrawal paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalCompleted {
    /// Withdrawing account.
    pub account: AccountId,
    /// Shares burned.
    pub shares: u128,
    /// Asset paid.
    pub amount: u128,
    /// Round the withdrawal was priced at.
    pub round: u64,
}

/// Event: expiring position settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortClosed {
    /// Settled series.
    pub option_id: OptionId,
    /// Collateral that was locked.
    pub locked_amount: u128,
    /// Collateral returned by the protocol.
    pub payout: u128,
    /// Round being closed.
    pub round: u64,
}

/// Event: fees charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultFeesCollected {
    /// Round being closed.
    pub round: u64,
    /// Performance fee.
    pub performance_fee: u128,
    /// Management fee.
    pub management_fee: u128,
    /// Account receiving the fees.
    pub recipient: AccountId,
}

/// Event: round priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundClosed {
    /// Round that closed.
    pub round: u64,
    /// Price-per-share recorded for it.
    pub price_per_share: u128,
    /// Shares minted for the round's pending deposits.
    pub minted_shares: u128,
    /// Asset reserved for queued withdrawals after the close.
    pub queued_withdraw_amount: u128,
    /// Close time.
    pub closed_at: Timestamp,
}

/// Event: next option committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOptionStrikeSelected {
    /// Round the option will run in.
    pub round: u64,
    /// Committed series.
    pub option_id: OptionId,
    /// Strike.
    pub strike: Decimal,
    /// Expiry.
    pub expiry: Timestamp,
    /// Whether the owner's override was used.
    pub overridden: bool,
}

/// Event: position opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortOpened {
    /// Current round.
    pub round: u64,
    /// Series written.
    pub option_id: OptionId,
    /// Collateral locked.
    pub collateral: u128,
    /// Supply minted.
    pub minted_supply: u128,
}

/// Event: auction opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionStarted {
    /// Current round.
    pub round: u64,
    /// Auction.
    pub auction_id: AuctionId,
    /// Series sold.
    pub option_id: OptionId,
    /// Supply offered.
    pub supply: u128,
    /// Minimum price, asset per option.
    pub min_price: Decimal,
}

/// Event: auction settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSettled {
    /// Current round.
    pub round: u64,
    /// Auction.
    pub auction_id: AuctionId,
    /// Asset received.
    pub proceeds: u128,
    /// Supply left unsold.
    pub unsold_supply: u128,
}

/// Event: unsold supply burned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsBurned {
    /// Current round.
    pub round: u64,
    /// Series burned.
    pub option_id: OptionId,
    /// Supply burned.
    pub burned_supply: u128,
    /// Collateral released to the free balance.
    pub released_collateral: u128,
}

/// Owner-controlled settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultSetting {
    /// Deposit cap.
    Cap,
    /// Annual management fee.
    ManagementFee,
    /// Performance fee.
    PerformanceFee,
    /// Manual strike for the current round.
    StrikeOverride,
    /// Keeper account.
    Keeper,
    /// Fee recipient account.
    FeeRecipient,
    /// Auction minimum price discount.
    PremiumDiscount,
    /// Auction duration.
    AuctionDuration,
}

/// Event: owner setting changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingChanged {
    /// Current round.
    pub round: u64,
    /// Setting.
    pub setting: VaultSetting,
    /// Previous value, rendered.
    pub previous: String,
    /// New value, rendered.
    pub current: String,
}
