// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::significant_drop_tightening,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Vault Engine - Rust Core Library
//!
//! Round-based share accounting and option rollover for covered-call and
//! cash-secured-put vaults.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Ledger rules with no I/O
//!   - `shared`: identifiers, `Timestamp`, `Rate`
//!   - `vault`: `Vault` aggregate, ledger entities, share math, fee calculator,
//!     rollover phase machine, domain events
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for collaborators (`DerivativesProtocolPort`, `AuctionPort`,
//!     `StrikeSelectorPort`, `ClockPort`, `EventPublisherPort`)
//!   - `use_cases`: `CommitAndClose`, `RollToNextOption`, `AuctionSettlement`
//!   - `services`: `VaultService` facade (roles, transaction boundary)
//!   - `dto`: Vault and account snapshots
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `protocol`, `auction`, `strike_selection`: simulated collaborators for paper mode
//!   - `clock`, `messaging`: manual clock, event publishers
//!   - `http`: axum REST API

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Vault ledger rules with no external dependencies.
pub mod domain;

/// Application layer - Use cases, facade and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and the HTTP API.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// YAML configuration.
pub mod config;

/// API error codes.
pub mod error;

/// Tracing setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use domain::shared::{AccountId, AuctionId, OptionId, Rate, Timestamp};
pub use domain::vault::{Vault, VaultError, VaultEvent, VaultParams};

pub use application::services::{Role, VaultService, VaultServiceError};
pub use application::use_cases::{RolloverError, RolloverSettings};

pub use infrastructure::http::{AppState, create_router};
