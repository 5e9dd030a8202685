//! Vault-wide accounting record.

use serde::{Deserialize, Serialize};

use super::{ActiveOption, OptionSeries, StrikeOverride};
use crate::domain::shared::{OptionId, Rate, Timestamp};

/// Round counters, balances and option pointers for one vault.
///
/// Only the aggregate mutates this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    /// Current round, starting at 1.
    pub round: u64,
    /// Deposits made in the current round, not yet converted to shares.
    pub total_pending: u128,
    /// Shares debited from holders and not yet paid out.
    pub queued_withdraw_shares: u128,
    /// Part of `queued_withdraw_shares` queued during the current round.
    pub current_queued_withdraw_shares: u128,
    /// Asset reserved for withdrawals priced at earlier closes.
    pub last_queued_withdraw_amount: u128,
    /// Asset committed to the active option.
    pub locked_amount: u128,
    /// Locked amount of the previous round; performance fee baseline.
    pub last_locked_amount: u128,
    /// Asset held by the vault and not locked.
    pub free_balance: u128,
    /// Maximum total balance.
    pub cap: u128,
    /// Minimum share supply the first deposit must mint.
    pub minimum_supply: u128,
    /// Annual management fee.
    pub management_fee: Rate,
    /// Performance fee on net gains per round.
    pub performance_fee: Rate,
    /// Option the vault is short, if any.
    pub current_option: Option<ActiveOption>,
    /// Option committed for the next round, if any.
    pub next_option: Option<OptionSeries>,
    /// Earliest time the committed option may be rolled into.
    pub next_option_ready_at: Option<Timestamp>,
    /// Owner strike override.
    pub strike_override: Option<StrikeOverride>,
    /// When the previous round closed.
    pub last_round_closed_at: Option<Timestamp>,
}

impl VaultState {
    /// Fresh state at round 1.
    #[must_use]
    pub const fn new(
        cap: u128,
        minimum_supply: u128,
        management_fee: Rate,
        performance_fee: Rate,
    ) -> Self {
        Self {
            round: 1,
            total_pending: 0,
            queued_withdraw_shares: 0,
            current_queued_withdraw_shares: 0,
            last_queued_withdraw_amount: 0,
            locked_amount: 0,
            last_locked_amount: 0,
            free_balance: 0,
            cap,
            minimum_supply,
            management_fee,
            performance_fee,
            current_option: None,
            next_option: None,
            next_option_ready_at: None,
            strike_override: None,
            last_round_closed_at: None,
        }
    }

    /// Free plus locked asset.
    #[must_use]
    pub const fn total_balance(&self) -> u128 {
        self.free_balance.saturating_add(self.locked_amount)
    }

    /// Identifier of the active option.
    #[must_use]
    pub fn current_option_id(&self) -> Option<&OptionId> {
        self.current_option.as_ref().map(|o| &o.series.id)
    }

    /// Identifier of the committed next option.
    #[must_use]
    pub fn next_option_id(&self) -> Option<&OptionId> {
        self.next_option.as_ref().map(|o| &o.id)
    }

    /// Queued shares that were priced at an earlier close.
    #[must_use]
    pub const fn priced_queued_shares(&self) -> u128 {
        self.queued_withdraw_shares
            .saturating_sub(self.current_queued_withdraw_shares)
    }
}
