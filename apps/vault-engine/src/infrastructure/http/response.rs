//! HTTP response DTOs.

use serde::{Deserialize, Serialize};

use crate::application::dto::RoundPriceDto;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Acknowledgement for calls with no return value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AckResponse {
    /// Always true.
    pub ok: bool,
}

impl AckResponse {
    /// Successful acknowledgement.
    pub const OK: Self = Self { ok: true };
}

/// Asset amount paid out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AmountResponse {
    /// Amount in base units.
    pub amount: u128,
}

/// Shares moved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SharesResponse {
    /// Share amount.
    pub shares: u128,
}

/// Recorded round prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundPricesResponse {
    /// One entry per closed round, oldest first.
    pub rounds: Vec<RoundPriceDto>,
}
