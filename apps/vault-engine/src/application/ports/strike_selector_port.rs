//! Strike Selector Port (Driven Port)

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::shared::Timestamp;

/// Strike selection or pricing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// No strike or premium could be produced.
    #[error("No quote available: {reason}")]
    NoQuote { reason: String },

    /// Pricing source unreachable.
    #[error("Strike selector unavailable: {message}")]
    Unavailable { message: String },
}

/// Port choosing strikes and pricing premiums.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StrikeSelectorPort: Send + Sync {
    /// Strike for a series expiring at `expiry`.
    async fn get_strike_price(&self, expiry: Timestamp, is_put: bool)
    -> Result<Decimal, SelectorError>;

    /// Premium per option, in asset.
    async fn get_premium(
        &self,
        strike: Decimal,
        expiry: Timestamp,
        is_put: bool,
    ) -> Result<Decimal, SelectorError>;
}
