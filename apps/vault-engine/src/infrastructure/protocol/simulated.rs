//! In-memory derivatives protocol.
//!
//! Puts are collateralized by `strike` units of asset per option, calls by
//! one unit of underlying per option. Expired series settle against a
//! configurable expiry price, defaulting to the strike. Settling a series
//! again reports the payout of the first settlement.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::application::ports::{
    DerivativesError, DerivativesProtocolPort, OpenPositionRequest, OpenedPosition, SeriesRequest,
};
use crate::domain::shared::{OptionId, Timestamp};
use crate::domain::vault::services::share_math::mul_div;

#[derive(Debug, Clone)]
struct SeriesRecord {
    strike: Decimal,
    expiry: Timestamp,
    is_put: bool,
    collateral: u128,
    minted: u128,
    burned: u128,
    released: u128,
    payout: Option<u128>,
}

impl SeriesRecord {
    const fn outstanding(&self) -> u128 {
        self.minted.saturating_sub(self.burned)
    }

    const fn remaining_collateral(&self) -> u128 {
        self.collateral.saturating_sub(self.released)
    }
}

/// Simulated derivatives protocol.
#[derive(Debug)]
pub struct SimulatedDerivativesProtocol {
    decimals: u8,
    expiry_price: RwLock<Option<Decimal>>,
    series: RwLock<HashMap<OptionId, SeriesRecord>>,
}

impl SimulatedDerivativesProtocol {
    /// Create a protocol for an asset with `decimals` decimals.
    #[must_use]
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals,
            expiry_price: RwLock::new(None),
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Set the underlying price used to settle expired series.
    pub fn set_expiry_price(&self, price: Decimal) {
        *self
            .expiry_price
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(price);
    }

    /// Asset decimals.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Collateral still held for `option_id`.
    #[must_use]
    pub fn open_collateral(&self, option_id: &OptionId) -> Option<u128> {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(option_id)
            .map(SeriesRecord::remaining_collateral)
    }

    /// Supply of `option_id` minted and not burned.
    #[must_use]
    pub fn outstanding_supply(&self, option_id: &OptionId) -> Option<u128> {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(option_id)
            .map(SeriesRecord::outstanding)
    }

    /// Number of series created.
    #[must_use]
    pub fn series_count(&self) -> usize {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn series_id(request: &SeriesRequest) -> OptionId {
        OptionId::new(format!(
            "{}-{}-{}",
            if request.is_put { "P" } else { "C" },
            request.strike.normalize(),
            request.expiry.unix_seconds()
        ))
    }

    fn to_decimal(amount: u128) -> Result<Decimal, DerivativesError> {
        Decimal::from_u128(amount).ok_or_else(|| DerivativesError::Rejected {
            reason: format!("amount {amount} out of range"),
        })
    }

    fn to_units(value: Decimal) -> Result<u128, DerivativesError> {
        value
            .floor()
            .to_u128()
            .ok_or_else(|| DerivativesError::Rejected {
                reason: format!("value {value} out of range"),
            })
    }

    fn unknown(option_id: &OptionId) -> DerivativesError {
        DerivativesError::UnknownOption {
            option_id: option_id.to_string(),
        }
    }

    /// Collateral owed to option holders at `price`.
    fn holder_claim(record: &SeriesRecord, price: Decimal) -> Result<u128, DerivativesError> {
        let outstanding = Self::to_decimal(record.outstanding())?;
        let claim = if record.is_put {
            let intrinsic = (record.strike - price).max(Decimal::ZERO);
            outstanding.checked_mul(intrinsic)
        } else if price <= Decimal::ZERO {
            Some(Decimal::ZERO)
        } else {
            let intrinsic = (price - record.strike).max(Decimal::ZERO);
            outstanding
                .checked_mul(intrinsic)
                .and_then(|v| v.checked_div(price))
        };
        let claim = claim.ok_or_else(|| DerivativesError::Rejected {
            reason: "settlement value out of range".to_string(),
        })?;
        Self::to_units(claim)
    }
}

#[async_trait]
impl DerivativesProtocolPort for SimulatedDerivativesProtocol {
    async fn get_or_create_series(
        &self,
        request: SeriesRequest,
    ) -> Result<OptionId, DerivativesError> {
        if request.strike <= Decimal::ZERO {
            return Err(DerivativesError::Rejected {
                reason: format!("strike {} must be positive", request.strike),
            });
        }
        let id = Self::series_id(&request);
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        series.entry(id.clone()).or_insert_with(|| SeriesRecord {
            strike: request.strike,
            expiry: request.expiry,
            is_put: request.is_put,
            collateral: 0,
            minted: 0,
            burned: 0,
            released: 0,
            payout: None,
        });
        tracing::debug!(option_id = %id, "Series available");
        Ok(id)
    }

    async fn expiry_of(&self, option_id: &OptionId) -> Result<Timestamp, DerivativesError> {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(option_id)
            .map(|record| record.expiry)
            .ok_or_else(|| Self::unknown(option_id))
    }

    async fn open_position(
        &self,
        request: OpenPositionRequest,
    ) -> Result<OpenedPosition, DerivativesError> {
        if request.collateral == 0 {
            return Err(DerivativesError::Rejected {
                reason: "collateral must be positive".to_string(),
            });
        }
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        let record = series
            .get_mut(&request.option_id)
            .ok_or_else(|| Self::unknown(&request.option_id))?;
        if record.strike != request.strike
            || record.expiry != request.expiry
            || record.is_put != request.is_put
        {
            return Err(DerivativesError::Rejected {
                reason: format!("terms do not match series {}", request.option_id),
            });
        }
        if record.payout.is_some() {
            return Err(DerivativesError::Rejected {
                reason: format!("series {} already settled", request.option_id),
            });
        }

        let minted = if record.is_put {
            let collateral = Self::to_decimal(request.collateral)?;
            Self::to_units(collateral / record.strike)?
        } else {
            request.collateral
        };
        if minted == 0 {
            return Err(DerivativesError::Rejected {
                reason: "collateral too small to mint one unit".to_string(),
            });
        }

        record.collateral = record.collateral.saturating_add(request.collateral);
        record.minted = record.minted.saturating_add(minted);
        tracing::debug!(
            option_id = %request.option_id,
            collateral = request.collateral,
            minted,
            "Position opened"
        );
        Ok(OpenedPosition {
            option_id: request.option_id,
            minted_supply: minted,
        })
    }

    async fn settle_expired(&self, option_id: &OptionId) -> Result<u128, DerivativesError> {
        let price = *self
            .expiry_price
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        let record = series
            .get_mut(option_id)
            .ok_or_else(|| Self::unknown(option_id))?;
        if let Some(payout) = record.payout {
            tracing::debug!(option_id = %option_id, payout, "Series already settled");
            return Ok(payout);
        }

        let price = price.unwrap_or(record.strike);
        let remaining = record.remaining_collateral();
        let claim = Self::holder_claim(record, price)?.min(remaining);
        let payout = remaining - claim;
        record.payout = Some(payout);
        record.released = record.collateral;

        tracing::debug!(option_id = %option_id, %price, payout, claim, "Series settled");
        Ok(payout)
    }

    async fn burn_options(
        &self,
        option_id: &OptionId,
        amount: u128,
    ) -> Result<u128, DerivativesError> {
        let mut series = self.series.write().unwrap_or_else(PoisonError::into_inner);
        let record = series
            .get_mut(option_id)
            .ok_or_else(|| Self::unknown(option_id))?;
        if record.payout.is_some() {
            return Err(DerivativesError::Rejected {
                reason: format!("series {option_id} already settled"),
            });
        }
        if amount == 0 || amount > record.outstanding() {
            return Err(DerivativesError::Rejected {
                reason: format!(
                    "cannot burn {amount} of {} outstanding",
                    record.outstanding()
                ),
            });
        }
        let released = mul_div(amount, record.collateral, record.minted)
            .ok_or_else(|| DerivativesError::Rejected {
                reason: "burn value out of range".to_string(),
            })?
            .min(record.remaining_collateral());
        record.burned += amount;
        record.released += released;
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const UNIT: u128 = 1_000_000;

    fn expiry() -> Timestamp {
        Timestamp::parse("2026-01-16T08:00:00Z").unwrap()
    }

    async fn opened_put(protocol: &SimulatedDerivativesProtocol) -> OptionId {
        let id = protocol
            .get_or_create_series(SeriesRequest {
                strike: dec!(2000),
                expiry: expiry(),
                is_put: true,
            })
            .await
            .unwrap();
        let opened = protocol
            .open_position(OpenPositionRequest {
                option_id: id.clone(),
                collateral: 10_000 * UNIT,
                strike: dec!(2000),
                expiry: expiry(),
                is_put: true,
            })
            .await
            .unwrap();
        assert_eq!(opened.minted_supply, 5 * UNIT);
        id
    }

    #[tokio::test]
    async fn series_is_reused_for_same_terms() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        let request = SeriesRequest {
            strike: dec!(2000),
            expiry: expiry(),
            is_put: true,
        };
        let a = protocol.get_or_create_series(request.clone()).await.unwrap();
        let b = protocol.get_or_create_series(request).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(protocol.series_count(), 1);
        assert_eq!(protocol.expiry_of(&a).await.unwrap(), expiry());
    }

    #[tokio::test]
    async fn out_of_the_money_put_returns_all_collateral() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        let id = opened_put(&protocol).await;
        protocol.set_expiry_price(dec!(2100));

        assert_eq!(protocol.settle_expired(&id).await.unwrap(), 10_000 * UNIT);
        assert_eq!(protocol.open_collateral(&id), Some(0));
    }

    #[tokio::test]
    async fn settling_twice_reports_the_first_payout() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        let id = opened_put(&protocol).await;
        protocol.set_expiry_price(dec!(1800));
        let first = protocol.settle_expired(&id).await.unwrap();

        protocol.set_expiry_price(dec!(1000));
        assert_eq!(protocol.settle_expired(&id).await.unwrap(), first);
        assert!(protocol.burn_options(&id, UNIT).await.is_err());
    }

    #[tokio::test]
    async fn burned_position_reopens_at_the_same_terms() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        let id = opened_put(&protocol).await;
        assert_eq!(protocol.burn_options(&id, 5 * UNIT).await.unwrap(), 10_000 * UNIT);
        assert_eq!(protocol.open_collateral(&id), Some(0));
        assert_eq!(protocol.outstanding_supply(&id), Some(0));

        let reopened = opened_put(&protocol).await;
        assert_eq!(reopened, id);
        assert_eq!(protocol.open_collateral(&id), Some(10_000 * UNIT));
        assert_eq!(protocol.outstanding_supply(&id), Some(5 * UNIT));
        protocol.set_expiry_price(dec!(1800));
        assert_eq!(protocol.settle_expired(&id).await.unwrap(), 9_000 * UNIT);
    }

    #[tokio::test]
    async fn in_the_money_put_pays_holders() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        let id = opened_put(&protocol).await;
        protocol.set_expiry_price(dec!(1800));

        // 5 options × 200 intrinsic
        assert_eq!(
            protocol.settle_expired(&id).await.unwrap(),
            10_000 * UNIT - 1_000 * UNIT
        );
    }

    #[tokio::test]
    async fn burn_releases_proportional_collateral() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        let id = opened_put(&protocol).await;

        assert_eq!(protocol.burn_options(&id, 2 * UNIT).await.unwrap(), 4_000 * UNIT);
        assert!(protocol.burn_options(&id, 4 * UNIT).await.is_err());
        protocol.set_expiry_price(dec!(1000));
        // 3 outstanding × 1000 intrinsic, capped by the 6000 still locked
        assert_eq!(protocol.settle_expired(&id).await.unwrap(), 3_000 * UNIT);
    }

    #[tokio::test]
    async fn call_mints_one_option_per_unit() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        let id = protocol
            .get_or_create_series(SeriesRequest {
                strike: dec!(3000),
                expiry: expiry(),
                is_put: false,
            })
            .await
            .unwrap();
        let opened = protocol
            .open_position(OpenPositionRequest {
                option_id: id.clone(),
                collateral: 2 * UNIT,
                strike: dec!(3000),
                expiry: expiry(),
                is_put: false,
            })
            .await
            .unwrap();
        assert_eq!(opened.minted_supply, 2 * UNIT);

        protocol.set_expiry_price(dec!(4000));
        // 2 × (4000 − 3000) / 4000 = 0.5 underlying owed
        assert_eq!(protocol.settle_expired(&id).await.unwrap(), 2 * UNIT - UNIT / 2);
    }

    #[tokio::test]
    async fn unknown_series_is_rejected() {
        let protocol = SimulatedDerivativesProtocol::new(6);
        assert!(matches!(
            protocol.expiry_of(&OptionId::new("nope")).await,
            Err(DerivativesError::UnknownOption { .. })
        ));
    }
}
