//! Shared fixture: a paper vault wired to the simulated collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vault_engine::application::ports::ClockPort;
use vault_engine::application::use_cases::RolloverSettings;
use vault_engine::domain::vault::services::RolloverPhase;
use vault_engine::infrastructure::auction::SimulatedAuction;
use vault_engine::infrastructure::clock::ManualClock;
use vault_engine::infrastructure::messaging::RecordingEventPublisher;
use vault_engine::infrastructure::protocol::SimulatedDerivativesProtocol;
use vault_engine::infrastructure::strike_selection::ManualStrikeSelector;
use vault_engine::{AccountId, Rate, Timestamp, Vault, VaultParams, VaultService};

pub const DECIMALS: u8 = 6;
pub const UNIT: u128 = 1_000_000;
pub const WEEK: u64 = 7 * 24 * 60 * 60;
pub const DELAY: u64 = 900;

pub type PaperService = VaultService<
    SimulatedDerivativesProtocol,
    SimulatedAuction,
    ManualStrikeSelector,
    ManualClock,
    RecordingEventPublisher,
>;

pub struct Harness {
    pub service: PaperService,
    pub protocol: Arc<SimulatedDerivativesProtocol>,
    pub auction: Arc<SimulatedAuction>,
    pub selector: Arc<ManualStrikeSelector>,
    pub clock: Arc<ManualClock>,
    pub publisher: Arc<RecordingEventPublisher>,
}

/// A Friday, one hour after the weekly 08:00 UTC expiry.
pub fn start() -> Timestamp {
    Timestamp::parse("2026-01-16T09:00:00Z").unwrap()
}

pub fn params() -> VaultParams {
    VaultParams {
        asset: "USDC".to_string(),
        underlying: "WETH".to_string(),
        decimals: DECIMALS,
        is_put: true,
        cap: 1_000_000 * UNIT,
        minimum_supply: UNIT / 100,
        management_fee: Rate::fee(dec!(0.02)).unwrap(),
        performance_fee: Rate::fee(dec!(0.10)).unwrap(),
        owner: owner(),
        keeper: keeper(),
        fee_recipient: AccountId::new("treasury"),
        premium_discount: Rate::discount(dec!(0.95)).unwrap(),
        auction_duration_secs: 3_600,
    }
}

pub fn owner() -> AccountId {
    AccountId::new("owner")
}

pub fn keeper() -> AccountId {
    AccountId::new("keeper")
}

pub fn alice() -> AccountId {
    AccountId::new("alice")
}

pub fn bob() -> AccountId {
    AccountId::new("bob")
}

impl Harness {
    pub fn new() -> Self {
        Self::with(params(), dec!(0))
    }

    /// Vault with the given parameters and auction fill ratio.
    pub fn with(params: VaultParams, fill_ratio: Decimal) -> Self {
        let protocol = Arc::new(SimulatedDerivativesProtocol::new(DECIMALS));
        let auction = Arc::new(SimulatedAuction::new(fill_ratio));
        let selector = Arc::new(ManualStrikeSelector::new(dec!(2000), dec!(20)));
        let clock = Arc::new(ManualClock::new(start()));
        let publisher = Arc::new(RecordingEventPublisher::new());
        let service = VaultService::new(
            Vault::new(params).unwrap(),
            Arc::clone(&protocol),
            Arc::clone(&auction),
            Arc::clone(&selector),
            Arc::clone(&clock),
            Arc::clone(&publisher),
            RolloverSettings::default(),
        );
        Self {
            service,
            protocol,
            auction,
            selector,
            clock,
            publisher,
        }
    }

    /// Close the round, wait out the delay, and roll.
    pub async fn close_and_roll(&self) -> u128 {
        let summary = self.service.commit_and_close(&keeper()).await.unwrap();
        self.clock.advance(DELAY);
        self.service.roll_to_next_option(&keeper()).await.unwrap();
        summary.price_per_share
    }

    /// Rollover phase at the current clock time.
    pub async fn phase(&self) -> RolloverPhase {
        let now = self.clock.now();
        self.service.read(|vault| vault.rollover_phase(now)).await
    }

    /// Move the clock to `weeks` weekly expiries after the start.
    pub fn at_week(&self, weeks: u64) {
        self.clock.set(start().plus_seconds(weeks * WEEK));
    }
}
