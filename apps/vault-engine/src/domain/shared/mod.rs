//! Shared kernel - types used across bounded contexts.

pub mod value_objects;

pub use value_objects::{AccountId, AuctionId, OptionId, RATE_SCALE, Rate, RateError, Timestamp};
