//! Share Price Calculator.
//!
//! Fixed-point conversion between asset amounts and shares. A price-per-share
//! is expressed in asset base units per `10^decimals` shares, so the unit
//! price equals `10^decimals`. All conversions round down.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::domain::vault::errors::VaultError;

/// Prices at or below this value are treated as uninitialised.
pub const PLACEHOLDER_PRICE: u128 = 1;

/// Largest supported asset precision.
pub const MAX_DECIMALS: u8 = 18;

/// Inputs to the price-per-share formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInputs {
    /// Free plus locked asset, after fees.
    pub total_balance: u128,
    /// Asset already reserved for priced withdrawals.
    pub reserved_for_withdrawals: u128,
    /// Deposits of the closing round, not yet in shares.
    pub total_pending: u128,
    /// Total share supply.
    pub total_supply: u128,
    /// Shares queued and already priced at an earlier close.
    pub priced_queued_shares: u128,
}

/// Share math for an asset with a fixed number of decimals.
pub struct ShareMath;

impl ShareMath {
    /// `10^decimals`.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` when `decimals` exceeds [`MAX_DECIMALS`].
    pub fn unit(decimals: u8) -> Result<u128, VaultError> {
        if decimals > MAX_DECIMALS {
            return Err(VaultError::InvalidSetting {
                setting: "decimals",
                reason: format!("at most {MAX_DECIMALS} supported, got {decimals}"),
            });
        }
        Ok(10_u128.pow(u32::from(decimals)))
    }

    /// `floor(amount × 10^decimals / price_per_share)`.
    pub fn asset_to_shares(
        amount: u128,
        price_per_share: u128,
        decimals: u8,
    ) -> Result<u128, VaultError> {
        Self::require_price(price_per_share)?;
        mul_div(amount, Self::unit(decimals)?, price_per_share)
            .ok_or(VaultError::overflow("asset to shares"))
    }

    /// `floor(shares × price_per_share / 10^decimals)`.
    pub fn shares_to_asset(
        shares: u128,
        price_per_share: u128,
        decimals: u8,
    ) -> Result<u128, VaultError> {
        Self::require_price(price_per_share)?;
        mul_div(shares, price_per_share, Self::unit(decimals)?)
            .ok_or(VaultError::overflow("shares to asset"))
    }

    /// Price-per-share of the round being closed.
    ///
    /// Priced queued shares and their reserve, and pending deposits, are
    /// excluded. Clamped to the unit price when no shares take part.
    pub fn price_per_share(inputs: PriceInputs, decimals: u8) -> Result<u128, VaultError> {
        let unit = Self::unit(decimals)?;
        let share_supply = inputs
            .total_supply
            .checked_sub(inputs.priced_queued_shares)
            .ok_or_else(|| VaultError::underflow("share supply"))?;
        if share_supply == 0 {
            return Ok(unit);
        }
        let net_assets = inputs
            .total_balance
            .checked_sub(inputs.reserved_for_withdrawals)
            .and_then(|v| v.checked_sub(inputs.total_pending))
            .ok_or_else(|| VaultError::underflow("net asset balance"))?;
        mul_div(net_assets, unit, share_supply).ok_or(VaultError::overflow("price per share"))
    }

    fn require_price(price_per_share: u128) -> Result<(), VaultError> {
        if price_per_share <= PLACEHOLDER_PRICE {
            return Err(VaultError::InvalidPricePerShare {
                price: price_per_share,
            });
        }
        Ok(())
    }
}

/// `floor(a × b / denominator)` with a 256-bit intermediate product.
///
/// `None` when `denominator` is zero or the quotient does not fit in `u128`.
#[must_use]
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Option<u128> {
    let quotient = U256::from(a)
        .checked_mul(U256::from(b))?
        .checked_div(U256::from(denominator))?;
    (quotient.bits() <= 128).then(|| quotient.low_u128())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    const USDC: u8 = 6;
    const WETH: u8 = 18;

    #[test_case(USDC, 1_000_000 ; "six decimals")]
    #[test_case(WETH, 1_000_000_000_000_000_000 ; "eighteen decimals")]
    #[test_case(0, 1 ; "no decimals")]
    fn unit_price(decimals: u8, expected: u128) {
        assert_eq!(ShareMath::unit(decimals).unwrap(), expected);
    }

    #[test]
    fn unit_rejects_excess_precision() {
        assert!(ShareMath::unit(19).is_err());
    }

    #[test]
    fn conversions_at_unit_price_are_identity() {
        let unit = ShareMath::unit(USDC).unwrap();
        assert_eq!(ShareMath::asset_to_shares(123_456, unit, USDC).unwrap(), 123_456);
        assert_eq!(ShareMath::shares_to_asset(123_456, unit, USDC).unwrap(), 123_456);
    }

    #[test]
    fn conversions_round_down() {
        // 1.5 asset per share
        let pps = 1_500_000;
        assert_eq!(ShareMath::asset_to_shares(100, pps, USDC).unwrap(), 66);
        assert_eq!(ShareMath::shares_to_asset(3, pps, USDC).unwrap(), 4);
    }

    #[test]
    fn placeholder_price_is_rejected() {
        let Err(err) = ShareMath::asset_to_shares(10, PLACEHOLDER_PRICE, USDC) else {
            panic!("expected InvalidPricePerShare");
        };
        assert_eq!(err, VaultError::InvalidPricePerShare { price: 1 });
        assert!(ShareMath::shares_to_asset(10, 0, USDC).is_err());
    }

    #[test]
    fn price_is_unit_without_participating_shares() {
        let inputs = PriceInputs {
            total_balance: 500,
            reserved_for_withdrawals: 0,
            total_pending: 500,
            total_supply: 0,
            priced_queued_shares: 0,
        };
        assert_eq!(ShareMath::price_per_share(inputs, USDC).unwrap(), 1_000_000);
    }

    #[test]
    fn price_excludes_reserved_and_pending() {
        // 100 shares participate; 110 asset at risk after removing reserve and pending.
        let inputs = PriceInputs {
            total_balance: 110 + 40 + 25,
            reserved_for_withdrawals: 40,
            total_pending: 25,
            total_supply: 130,
            priced_queued_shares: 30,
        };
        assert_eq!(ShareMath::price_per_share(inputs, 0).unwrap(), 1);
        assert_eq!(ShareMath::price_per_share(inputs, 2).unwrap(), 110);
    }

    #[test]
    fn large_eighteen_decimal_amounts_do_not_overflow() {
        let amount = 5_000_000 * 10_u128.pow(18);
        let pps = 1_050_000_000_000_000_000;
        let shares = ShareMath::asset_to_shares(amount, pps, WETH).unwrap();
        let back = ShareMath::shares_to_asset(shares, pps, WETH).unwrap();
        assert!(back <= amount);
        assert!(amount - back <= 2);
    }

    #[test]
    fn mul_div_handles_wide_products() {
        let a = u128::MAX / 3;
        assert_eq!(mul_div(a, 6, 2), Some(a * 3));
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
        assert_eq!(mul_div(1, 1, 0), None);
    }

    proptest! {
        #[test]
        fn mul_div_matches_narrow_arithmetic(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128, d in 1u128..u64::MAX as u128) {
            prop_assert_eq!(mul_div(a, b, d), Some(a * b / d));
        }

        #[test]
        fn mul_div_cancels_a_shared_factor(a in any::<u128>(), b in 1u128..) {
            prop_assert_eq!(mul_div(a, b, b), Some(a));
            prop_assert_eq!(mul_div(b, a, b), Some(a));
        }

        #[test]
        fn round_trip_never_creates_assets(amount in 0u128..1_000_000_000_000_000, pps in 2u128..10_000_000) {
            let shares = ShareMath::asset_to_shares(amount, pps, USDC).unwrap();
            let back = ShareMath::shares_to_asset(shares, pps, USDC).unwrap();
            prop_assert!(back <= amount);
        }
    }
}
