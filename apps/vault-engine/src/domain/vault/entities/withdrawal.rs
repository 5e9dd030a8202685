use serde::{Deserialize, Serialize};

/// An open withdrawal: shares debited from the depositor, waiting to be paid
/// at the price of the round they were queued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Round in which the withdrawal was initiated.
    pub round: u64,
    /// Queued shares.
    pub shares: u128,
}
