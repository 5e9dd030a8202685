//! Vault ledger errors.
//!
//! Every rejection leaves the vault unchanged.

use thiserror::Error;

use super::services::RolloverPhase;

/// Errors raised by vault ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// Amount or share count of zero where a positive value is required.
    #[error("{field} must be greater than zero")]
    ZeroAmount {
        /// Name of the offending input.
        field: &'static str,
    },

    /// Deposit would push the vault over its cap.
    #[error("deposit of {amount} exceeds cap {cap} (current balance {balance})")]
    CapExceeded {
        /// Requested deposit.
        amount: u128,
        /// Vault cap.
        cap: u128,
        /// Balance before the deposit.
        balance: u128,
    },

    /// First deposit into an empty vault is below the minimum supply.
    #[error("deposit into empty vault mints {shares} shares, below minimum supply {minimum}")]
    BelowMinimumSupply {
        /// Shares the deposit would mint at unit price.
        shares: u128,
        /// Configured minimum supply.
        minimum: u128,
    },

    /// More shares requested than the account holds.
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        /// Requested shares.
        requested: u128,
        /// Shares available to the account.
        available: u128,
    },

    /// Instant withdrawal above the pending deposit.
    #[error("insufficient pending deposit: requested {requested}, pending {pending}")]
    InsufficientPending {
        /// Requested amount.
        requested: u128,
        /// Pending amount in the current round.
        pending: u128,
    },

    /// Pending deposit is not in the current round.
    #[error("invalid round: receipt round {receipt_round}, vault round {vault_round}")]
    InvalidRound {
        /// Round stored on the receipt (0 when there is no receipt).
        receipt_round: u64,
        /// Current vault round.
        vault_round: u64,
    },

    /// A withdrawal from another round is still open.
    #[error("existing withdrawal from round {round} must be completed first")]
    ExistingWithdrawal {
        /// Round of the open withdrawal.
        round: u64,
    },

    /// No withdrawal has been initiated.
    #[error("withdrawal not initiated")]
    WithdrawalNotInitiated,

    /// Withdrawal round has not been priced yet.
    #[error("round {round} not closed")]
    RoundNotClosed {
        /// Round of the withdrawal.
        round: u64,
    },

    /// A next option is already committed.
    #[error("next option already pending")]
    NextOptionPending,

    /// Rolling without a committed option.
    #[error("no next option pending")]
    NoNextOptionPending,

    /// Rolling before the ready timestamp.
    #[error("next option not ready until {ready_at}")]
    NotReady {
        /// When the committed option becomes rollable.
        ready_at: String,
    },

    /// Operation needs an active option.
    #[error("no active option")]
    NoActiveOption,

    /// Active option has no auction to settle.
    #[error("no open auction for the active option")]
    AuctionNotOpen,

    /// Auction already settled.
    #[error("auction already settled")]
    AuctionAlreadySettled,

    /// Auction must settle before unsold supply can be burned.
    #[error("auction not settled")]
    AuctionNotSettled,

    /// No unsold option supply left to burn.
    #[error("no options to burn")]
    NothingToBurn,

    /// Vault still holds supply its auction did not sell.
    #[error("{supply} unsold options must be burned before the round closes")]
    UnsoldSupplyNotBurned {
        /// Unsold supply still held.
        supply: u128,
    },

    /// Price-per-share is the uninitialised placeholder.
    #[error("invalid price per share {price}")]
    InvalidPricePerShare {
        /// Offending price.
        price: u128,
    },

    /// Price history has no entry for a closed round.
    #[error("no price recorded for round {round}")]
    MissingRoundPrice {
        /// Round looked up.
        round: u64,
    },

    /// Price history entries are immutable and sequential.
    #[error("cannot record price for round {round}, expected round {expected}")]
    RoundAlreadyPriced {
        /// Round being recorded.
        round: u64,
        /// Next round the history accepts.
        expected: u64,
    },

    /// Fee rate outside `[0, 1)`.
    #[error("invalid {kind} fee: {reason}")]
    InvalidFee {
        /// Fee kind (management or performance).
        kind: &'static str,
        /// Validation failure.
        reason: String,
    },

    /// Cap of zero.
    #[error("cap must be greater than zero")]
    InvalidCap,

    /// Strike of zero or below.
    #[error("invalid strike price {strike}")]
    InvalidStrike {
        /// Offending strike.
        strike: String,
    },

    /// Other owner setting rejected.
    #[error("invalid setting {setting}: {reason}")]
    InvalidSetting {
        /// Setting name.
        setting: &'static str,
        /// Validation failure.
        reason: String,
    },

    /// Rollover phase does not permit the transition.
    #[error("invalid rollover transition {from} -> {to}")]
    InvalidPhaseTransition {
        /// Current phase.
        from: RolloverPhase,
        /// Requested phase.
        to: RolloverPhase,
    },

    /// Arithmetic overflow.
    #[error("arithmetic overflow in {context}")]
    Overflow {
        /// Where the overflow happened.
        context: &'static str,
    },

    /// Internal accounting would go negative.
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),
}

impl VaultError {
    /// Overflow helper for `checked_*` chains.
    #[must_use]
    pub const fn overflow(context: &'static str) -> Self {
        Self::Overflow { context }
    }

    /// Underflow of an internal counter.
    #[must_use]
    pub fn underflow(counter: &str) -> Self {
        Self::InvariantViolation(format!("{counter} would underflow"))
    }

    /// Whether the error is a caller-side precondition failure rather than an accounting fault.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        !matches!(
            self,
            Self::Overflow { .. } | Self::InvariantViolation(_) | Self::MissingRoundPrice { .. }
        )
    }
}
