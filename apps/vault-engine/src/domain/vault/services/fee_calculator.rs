//! Fee Calculator.
//!
//! Management fee accrues on the at-risk balance for the time elapsed since
//! the previous close. Performance fee applies only to the gain over the
//! previous round's locked amount. Pending deposits and reserved withdrawals
//! never pay fees.

use serde::{Deserialize, Serialize};

use super::share_math::mul_div;
use crate::domain::shared::{RATE_SCALE, Rate};
use crate::domain::vault::errors::VaultError;

/// 365 days.
pub const SECONDS_PER_YEAR: u128 = 31_536_000;

/// Inputs for one round close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeInputs {
    /// Free plus locked asset after the expiring position settled.
    pub total_balance: u128,
    /// Asset reserved for withdrawals priced at earlier closes.
    pub last_queued_withdraw_amount: u128,
    /// Deposits of the closing round.
    pub total_pending: u128,
    /// Locked amount of the round being closed.
    pub last_locked_amount: u128,
    /// Annual management fee rate.
    pub management_fee: Rate,
    /// Performance fee rate.
    pub performance_fee: Rate,
    /// Seconds since the previous close.
    pub elapsed_seconds: u64,
}

/// Fees charged at a round close.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultFees {
    /// Fee on net gains.
    pub performance_fee: u128,
    /// Time-based fee.
    pub management_fee: u128,
}

impl VaultFees {
    /// Sum of both fees.
    #[must_use]
    pub const fn total(&self) -> u128 {
        self.performance_fee.saturating_add(self.management_fee)
    }
}

/// Stateless fee calculator.
pub struct FeeCalculator;

impl FeeCalculator {
    /// Balance subject to fees.
    #[must_use]
    pub const fn fee_base(inputs: &FeeInputs) -> u128 {
        inputs
            .total_balance
            .saturating_sub(inputs.last_queued_withdraw_amount)
            .saturating_sub(inputs.total_pending)
    }

    /// Compute fees for a close. The total never exceeds the fee base.
    pub fn calculate(inputs: &FeeInputs) -> Result<VaultFees, VaultError> {
        let base = Self::fee_base(inputs);

        let gain = base.saturating_sub(inputs.last_locked_amount);
        let performance_fee = inputs
            .performance_fee
            .apply(gain)
            .ok_or(VaultError::overflow("performance fee"))?;

        let management_fee = if inputs.elapsed_seconds == 0 || inputs.management_fee.is_zero() {
            0
        } else {
            let rate_time = inputs
                .management_fee
                .scaled()
                .checked_mul(u128::from(inputs.elapsed_seconds))
                .ok_or(VaultError::overflow("management fee"))?;
            mul_div(base, rate_time, RATE_SCALE * SECONDS_PER_YEAR)
                .ok_or(VaultError::overflow("management fee"))?
        };

        let management_fee = management_fee.min(base - performance_fee.min(base));
        Ok(VaultFees {
            performance_fee: performance_fee.min(base),
            management_fee,
        })
    }
}
