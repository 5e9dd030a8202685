//! API error codes for the vault engine.
//!
//! Every facade error maps to a stable reason string and an HTTP status so
//! clients can branch on `code` without parsing messages.
//!
//! | Code | Status | Usage |
//! |------|--------|-------|
//! | `INVALID_REQUEST` | 400 | Zero amounts, bad fee/cap/strike/setting values |
//! | `UNAUTHORIZED` | 403 | Caller lacks the owner or keeper role |
//! | `ROUND_NOT_FOUND` | 404 | No price recorded for the round |
//! | `INVALID_ROUND` | 409 | Pending deposit is from an earlier round |
//! | `WITHDRAWAL_CONFLICT` | 409 | Withdrawal missing, unfinished or from another round |
//! | `ROLLOVER_CONFLICT` | 409 | Rollover step called out of order |
//! | `NOT_READY` | 409 | Committed option or expiry not reached yet |
//! | `CAP_EXCEEDED` | 422 | Deposit over the vault cap |
//! | `BELOW_MINIMUM_SUPPLY` | 422 | First deposit mints dust |
//! | `INSUFFICIENT_BALANCE` | 422 | Not enough shares or pending deposit |
//! | `COLLABORATOR_ERROR` | 502 | Derivatives protocol, auction or selector failure |
//! | `INTERNAL_ERROR` | 500 | Overflow or broken ledger invariant |

use std::collections::HashMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::services::VaultServiceError;
use crate::application::use_cases::RolloverError;
use crate::domain::vault::VaultError;

/// Error codes exposed by the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or out-of-range input.
    InvalidRequest,
    /// Caller lacks the required role.
    Unauthorized,
    /// Round has no recorded price.
    RoundNotFound,
    /// Pending deposit belongs to another round.
    InvalidRound,
    /// Withdrawal state does not permit the call.
    WithdrawalConflict,
    /// Rollover step called out of order.
    RolloverConflict,
    /// Timelock or expiry not reached.
    NotReady,
    /// Deposit over the cap.
    CapExceeded,
    /// First deposit below the minimum supply.
    BelowMinimumSupply,
    /// Not enough shares or pending deposit.
    InsufficientBalance,
    /// External collaborator failed or answered nonsense.
    CollaboratorError,
    /// Internal server error.
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::RoundNotFound => StatusCode::NOT_FOUND,
            Self::InvalidRound
            | Self::WithdrawalConflict
            | Self::RolloverConflict
            | Self::NotReady => StatusCode::CONFLICT,
            Self::CapExceeded | Self::BelowMinimumSupply | Self::InsufficientBalance => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::CollaboratorError => StatusCode::BAD_GATEWAY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::RoundNotFound => "ROUND_NOT_FOUND",
            Self::InvalidRound => "INVALID_ROUND",
            Self::WithdrawalConflict => "WITHDRAWAL_CONFLICT",
            Self::RolloverConflict => "ROLLOVER_CONFLICT",
            Self::NotReady => "NOT_READY",
            Self::CapExceeded => "CAP_EXCEEDED",
            Self::BelowMinimumSupply => "BELOW_MINIMUM_SUPPLY",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::CollaboratorError => "COLLABORATOR_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    fn for_vault(error: &VaultError) -> Self {
        match error {
            VaultError::ZeroAmount { .. }
            | VaultError::InvalidFee { .. }
            | VaultError::InvalidCap
            | VaultError::InvalidStrike { .. }
            | VaultError::InvalidSetting { .. }
            | VaultError::InvalidPricePerShare { .. } => Self::InvalidRequest,
            VaultError::CapExceeded { .. } => Self::CapExceeded,
            VaultError::BelowMinimumSupply { .. } => Self::BelowMinimumSupply,
            VaultError::InsufficientShares { .. } | VaultError::InsufficientPending { .. } => {
                Self::InsufficientBalance
            }
            VaultError::InvalidRound { .. } => Self::InvalidRound,
            VaultError::ExistingWithdrawal { .. }
            | VaultError::WithdrawalNotInitiated
            | VaultError::RoundNotClosed { .. } => Self::WithdrawalConflict,
            VaultError::NextOptionPending
            | VaultError::NoNextOptionPending
            | VaultError::NoActiveOption
            | VaultError::AuctionNotOpen
            | VaultError::AuctionAlreadySettled
            | VaultError::AuctionNotSettled
            | VaultError::NothingToBurn
            | VaultError::UnsoldSupplyNotBurned { .. }
            | VaultError::InvalidPhaseTransition { .. } => Self::RolloverConflict,
            VaultError::NotReady { .. } => Self::NotReady,
            VaultError::MissingRoundPrice { .. } => Self::RoundNotFound,
            VaultError::RoundAlreadyPriced { .. }
            | VaultError::Overflow { .. }
            | VaultError::InvariantViolation(_) => Self::InternalError,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl ApiError {
    /// Create a new API error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Invalid request input.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Render as a response body.
    #[must_use]
    pub fn to_body(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code.reason().to_string(),
            message: self.message.clone(),
            status: self.code.status().as_u16(),
            details: self.context.iter().cloned().collect(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

impl From<VaultError> for ApiError {
    fn from(error: VaultError) -> Self {
        let api = Self::new(ErrorCode::for_vault(&error), error.to_string());
        match error {
            VaultError::InvalidRound {
                receipt_round,
                vault_round,
            } => api
                .with_context("receipt_round", receipt_round.to_string())
                .with_context("vault_round", vault_round.to_string()),
            VaultError::RoundNotClosed { round }
            | VaultError::ExistingWithdrawal { round }
            | VaultError::MissingRoundPrice { round } => {
                api.with_context("round", round.to_string())
            }
            VaultError::NotReady { ready_at } => api.with_context("ready_at", ready_at),
            _ => api,
        }
    }
}

impl From<RolloverError> for ApiError {
    fn from(error: RolloverError) -> Self {
        match error {
            RolloverError::Vault(e) => e.into(),
            RolloverError::OptionNotExpired {
                ref option_id,
                ref expiry,
            } => Self::new(ErrorCode::NotReady, error.to_string())
                .with_context("option_id", option_id.clone())
                .with_context("expiry", expiry.clone()),
            RolloverError::InvalidCollaboratorResponse { collaborator, .. } => {
                Self::new(ErrorCode::CollaboratorError, error.to_string())
                    .with_context("collaborator", collaborator)
            }
            RolloverError::Derivatives(_) => {
                Self::new(ErrorCode::CollaboratorError, error.to_string())
                    .with_context("collaborator", "derivatives_protocol")
            }
            RolloverError::Auction(_) => Self::new(ErrorCode::CollaboratorError, error.to_string())
                .with_context("collaborator", "auction"),
            RolloverError::Selector(_) => {
                Self::new(ErrorCode::CollaboratorError, error.to_string())
                    .with_context("collaborator", "strike_selector")
            }
        }
    }
}

impl From<VaultServiceError> for ApiError {
    fn from(error: VaultServiceError) -> Self {
        match error {
            VaultServiceError::Vault(e) => e.into(),
            VaultServiceError::Rollover(e) => e.into(),
            VaultServiceError::Unauthorized { ref caller, required } => {
                Self::new(ErrorCode::Unauthorized, error.to_string())
                    .with_context("caller", caller.to_string())
                    .with_context("required", required.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        }
        (status, Json(self.to_body())).into_response()
    }
}

/// HTTP error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Additional details.
    pub details: HashMap<String, String>,
}
