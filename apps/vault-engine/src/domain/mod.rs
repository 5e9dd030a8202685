//! Domain Layer
//!
//! Vault ledger rules with no I/O and no knowledge of external venues.

pub mod shared;
pub mod vault;
