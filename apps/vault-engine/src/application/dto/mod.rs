//! Data Transfer Objects (DTOs)
//!
//! Read-side views of the vault returned by the facade and the HTTP API.

mod vault_dto;

pub use vault_dto::{AccountSnapshotDto, ActiveOptionDto, RoundPriceDto, VaultSnapshotDto};
