//! Vault aggregate root.
//!
//! Split by concern: construction and queries, the deposit/redemption
//! engine, rollover ledger transitions, and owner settings.

mod deposits;
mod rollover;
mod settings;
mod vault;

pub use rollover::{CloseRoundParams, CloseSummary, OpenRoundParams};
pub use settings::MIN_AUCTION_DURATION_SECS;
pub use vault::{Vault, VaultParams};
