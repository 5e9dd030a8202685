//! Derivatives Protocol Port (Driven Port)
//!
//! Interface to the protocol that creates option series, mints supply
//! against collateral and settles expired positions.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{OptionId, Timestamp};

/// Series lookup or creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    /// Strike price.
    pub strike: Decimal,
    /// Expiry.
    pub expiry: Timestamp,
    /// Put (true) or call (false).
    pub is_put: bool,
}

/// Request to lock collateral and mint option supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPositionRequest {
    /// Series to write.
    pub option_id: OptionId,
    /// Collateral to lock, in asset base units.
    pub collateral: u128,
    /// Strike price.
    pub strike: Decimal,
    /// Expiry.
    pub expiry: Timestamp,
    /// Put (true) or call (false).
    pub is_put: bool,
}

/// Position opened by the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedPosition {
    /// Series actually written.
    pub option_id: OptionId,
    /// Supply minted.
    pub minted_supply: u128,
}

/// Derivatives protocol error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivativesError {
    /// Unknown option series.
    #[error("Unknown option series: {option_id}")]
    UnknownOption { option_id: String },

    /// Protocol rejected the request.
    #[error("Derivatives protocol rejected request: {reason}")]
    Rejected { reason: String },

    /// Protocol unreachable.
    #[error("Derivatives protocol unavailable: {message}")]
    Unavailable { message: String },
}

/// Port for the derivatives protocol.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DerivativesProtocolPort: Send + Sync {
    /// Return the series for the given terms, creating it if needed.
    async fn get_or_create_series(&self, request: SeriesRequest)
    -> Result<OptionId, DerivativesError>;

    /// Expiry of a series.
    async fn expiry_of(&self, option_id: &OptionId) -> Result<Timestamp, DerivativesError>;

    /// Lock collateral and mint supply.
    async fn open_position(
        &self,
        request: OpenPositionRequest,
    ) -> Result<OpenedPosition, DerivativesError>;

    /// Settle an expired series, returning the collateral paid back.
    async fn settle_expired(&self, option_id: &OptionId) -> Result<u128, DerivativesError>;

    /// Burn unsold supply, returning the collateral released.
    async fn burn_options(
        &self,
        option_id: &OptionId,
        amount: u128,
    ) -> Result<u128, DerivativesError>;
}
