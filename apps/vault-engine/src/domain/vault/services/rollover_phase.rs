//! Rollover phase state machine.
//!
//! The phase is derived from vault state and the clock rather than stored.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Timestamp;
use crate::domain::vault::entities::VaultState;
use crate::domain::vault::errors::VaultError;

/// Where the vault is in its option cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloverPhase {
    /// No current and no committed option.
    Idle,
    /// Next option committed, waiting for its ready time.
    ReadyDelay,
    /// Next option committed and ready to roll.
    Committed,
    /// Short an option, nothing committed.
    Active,
}

impl RolloverPhase {
    /// Derive the phase at `now`.
    #[must_use]
    pub fn at(state: &VaultState, now: Timestamp) -> Self {
        if state.next_option.is_some() {
            match state.next_option_ready_at {
                Some(ready_at) if now < ready_at => Self::ReadyDelay,
                _ => Self::Committed,
            }
        } else if state.current_option.is_some() {
            Self::Active
        } else {
            Self::Idle
        }
    }
}

impl fmt::Display for RolloverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::ReadyDelay => "READY_DELAY",
            Self::Committed => "COMMITTED",
            Self::Active => "ACTIVE",
        };
        write!(f, "{name}")
    }
}

/// Validates rollover phase transitions.
///
/// `commit_and_close` moves to `ReadyDelay`, time moves `ReadyDelay` to
/// `Committed`, and `roll_to_next_option` moves `Committed` to `Active`.
pub struct RolloverStateMachine;

impl RolloverStateMachine {
    /// Check if a transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: RolloverPhase, to: RolloverPhase) -> bool {
        matches!(
            (from, to),
            (RolloverPhase::Idle | RolloverPhase::Active, RolloverPhase::ReadyDelay)
                | (RolloverPhase::ReadyDelay, RolloverPhase::Committed)
                | (RolloverPhase::Committed, RolloverPhase::Active)
        )
    }

    /// Validate a transition, naming the rejection.
    ///
    /// # Errors
    ///
    /// `NextOptionPending` for a second commit, `NoNextOptionPending` for a
    /// roll with nothing committed, `InvalidPhaseTransition` otherwise.
    pub fn validate_transition(from: RolloverPhase, to: RolloverPhase) -> Result<(), VaultError> {
        if Self::is_valid_transition(from, to) {
            return Ok(());
        }
        Err(match (from, to) {
            (RolloverPhase::ReadyDelay | RolloverPhase::Committed, RolloverPhase::ReadyDelay) => {
                VaultError::NextOptionPending
            }
            (RolloverPhase::Idle | RolloverPhase::Active, RolloverPhase::Active) => {
                VaultError::NoNextOptionPending
            }
            _ => VaultError::InvalidPhaseTransition { from, to },
        })
    }

    /// All valid next phases.
    #[must_use]
    pub fn valid_next_phases(from: RolloverPhase) -> Vec<RolloverPhase> {
        match from {
            RolloverPhase::Idle | RolloverPhase::Active => vec![RolloverPhase::ReadyDelay],
            RolloverPhase::ReadyDelay => vec![RolloverPhase::Committed],
            RolloverPhase::Committed => vec![RolloverPhase::Active],
        }
    }
}
