//! Infrastructure Layer
//!
//! Adapters for the application ports and the HTTP API.
//!
//! The bundled adapters simulate the derivatives protocol and the auction
//! venue in memory so the engine can run in paper mode.

pub mod auction;
pub mod clock;
pub mod http;
pub mod messaging;
pub mod protocol;
pub mod strike_selection;
