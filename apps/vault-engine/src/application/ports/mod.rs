//! Application Ports (Driven)
//!
//! Interfaces to the collaborators the vault depends on: the derivatives
//! protocol, the auction venue, the strike selector, the clock and the
//! event sink.

mod auction_port;
mod clock_port;
mod derivatives_port;
mod event_publisher_port;
mod strike_selector_port;

pub use auction_port::{AuctionError, AuctionPort, AuctionRequest, AuctionSettlement};
pub use clock_port::{ClockPort, SystemClock};
pub use derivatives_port::{
    DerivativesError, DerivativesProtocolPort, OpenPositionRequest, OpenedPosition, SeriesRequest,
};
pub use event_publisher_port::{EventPublishError, EventPublisherPort, NoOpEventPublisher};
pub use strike_selector_port::{SelectorError, StrikeSelectorPort};

#[cfg(test)]
pub use auction_port::MockAuctionPort;
#[cfg(test)]
pub use derivatives_port::MockDerivativesProtocolPort;
#[cfg(test)]
pub use strike_selector_port::MockStrikeSelectorPort;
