//! Ledger entities.
//!
//! Plain data owned by the [`Vault`](super::Vault) aggregate. Behaviour lives
//! in the domain services and the aggregate.

mod deposit_receipt;
mod option_state;
mod round_price_history;
mod share_ledger;
mod vault_state;
mod withdrawal;

pub use deposit_receipt::DepositReceipt;
pub use option_state::{ActiveOption, AuctionOutcome, AuctionState, OptionSeries, StrikeOverride};
pub use round_price_history::RoundPriceHistory;
pub use share_ledger::ShareLedger;
pub use vault_state::VaultState;
pub use withdrawal::Withdrawal;
