//! Shared value objects.

mod identifiers;
mod rate;
mod timestamp;

pub use identifiers::{AccountId, AuctionId, OptionId};
pub use rate::{RATE_SCALE, Rate, RateError};
pub use timestamp::Timestamp;
