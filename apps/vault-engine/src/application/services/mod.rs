//! Application Services

mod vault_service;

pub use vault_service::{Role, VaultService, VaultServiceError};
