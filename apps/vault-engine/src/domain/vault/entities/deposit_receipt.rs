use serde::{Deserialize, Serialize};

/// Per-depositor record of pending deposits and unredeemed shares.
///
/// `amount` is only meaningful while `round` equals the vault's current
/// round; once that round closes it is converted into `unredeemed_shares`
/// by [`materialize`](crate::domain::vault::services::materialize).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Last round in which a deposit or redeem touched this receipt.
    pub round: u64,
    /// Pending deposit, not yet converted to shares.
    pub amount: u128,
    /// Shares owed to the depositor but still held by the vault.
    pub unredeemed_shares: u128,
}

impl DepositReceipt {
    /// Receipt for a fresh deposit.
    #[must_use]
    pub const fn pending(round: u64, amount: u128) -> Self {
        Self {
            round,
            amount,
            unredeemed_shares: 0,
        }
    }

    /// True when nothing is pending and nothing is owed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount == 0 && self.unredeemed_shares == 0
    }
}
