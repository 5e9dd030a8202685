//! Application Layer
//!
//! Use cases that drive the vault aggregate through the rollover cycle, the
//! ports they depend on, and the facade that serializes access to the vault.

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;
