//! Vault bounded context.
//!
//! Share accounting, deposit/withdrawal bookkeeping and the ledger side of
//! option rollover for a single vault instance.

pub mod aggregate;
pub mod entities;
pub mod errors;
pub mod events;
pub mod services;

pub use aggregate::{CloseRoundParams, CloseSummary, OpenRoundParams, Vault, VaultParams};
pub use errors::VaultError;
pub use events::VaultEvent;
