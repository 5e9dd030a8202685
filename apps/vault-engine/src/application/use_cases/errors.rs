//! Rollover use-case errors.

use crate::application::ports::{AuctionError, DerivativesError, SelectorError};
use crate::domain::vault::VaultError;

/// Errors raised while driving the rollover cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RolloverError {
    /// Vault rejected the operation.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Derivatives protocol failed.
    #[error(transparent)]
    Derivatives(#[from] DerivativesError),

    /// Auction venue failed.
    #[error(transparent)]
    Auction(#[from] AuctionError),

    /// Strike selector failed.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// A collaborator answered with a value the vault cannot accept.
    #[error("invalid response from {collaborator}: {reason}")]
    InvalidCollaboratorResponse {
        /// Collaborator name.
        collaborator: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// The current option has not expired yet.
    #[error("option {option_id} expires at {expiry}")]
    OptionNotExpired {
        /// Current option.
        option_id: String,
        /// Its expiry.
        expiry: String,
    },
}

impl RolloverError {
    pub(crate) fn invalid_response(collaborator: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidCollaboratorResponse {
            collaborator,
            reason: reason.into(),
        }
    }

    /// Whether a collaborator, rather than the vault, caused the failure.
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::Derivatives(_)
                | Self::Auction(_)
                | Self::Selector(_)
                | Self::InvalidCollaboratorResponse { .. }
        )
    }
}
