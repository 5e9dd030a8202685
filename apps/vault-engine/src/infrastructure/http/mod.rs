//! HTTP/REST API adapter.
//!
//! Inbound adapter exposing the vault facade over axum.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::*;
pub use response::*;
