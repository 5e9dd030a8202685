//! Rollover use cases.
//!
//! Each use case fetches and validates collaborator responses first and then
//! applies a single aggregate mutation, so a failure leaves the vault as it was.

mod auction_settlement;
mod commit_and_close;
mod errors;
mod roll_to_next_option;

pub use auction_settlement::{AuctionSettlementUseCase, BurnSummary};
pub use commit_and_close::{CommitAndCloseUseCase, DEFAULT_DELAY_SECS, RolloverSettings};
pub use errors::RolloverError;
pub use roll_to_next_option::{RollSummary, RollToNextOptionUseCase};
