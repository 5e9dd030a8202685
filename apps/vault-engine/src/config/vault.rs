//! Vault parameters.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use super::rollover::RolloverConfig;
use crate::domain::shared::{AccountId, Rate};
use crate::domain::vault::VaultParams;

/// Vault configuration. Amounts are whole tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Deposit asset symbol.
    #[serde(default = "default_asset")]
    pub asset: String,
    /// Underlying of the options written.
    #[serde(default = "default_underlying")]
    pub underlying: String,
    /// Asset decimals.
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Put-selling vault when true, covered calls otherwise.
    #[serde(default = "default_is_put")]
    pub is_put: bool,
    /// Deposit cap in whole tokens.
    #[serde(default = "default_cap")]
    pub cap: Decimal,
    /// Minimum supply in whole shares.
    #[serde(default = "default_minimum_supply")]
    pub minimum_supply: Decimal,
    /// Annual management fee.
    #[serde(default = "default_management_fee")]
    pub management_fee: Decimal,
    /// Performance fee.
    #[serde(default = "default_performance_fee")]
    pub performance_fee: Decimal,
    /// Owner account.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Keeper account.
    #[serde(default = "default_keeper")]
    pub keeper: String,
    /// Fee recipient account.
    #[serde(default = "default_fee_recipient")]
    pub fee_recipient: String,
}

impl VaultConfig {
    /// Build aggregate parameters, converting whole tokens to base units.
    pub fn to_params(&self, rollover: &RolloverConfig) -> Result<VaultParams, ConfigError> {
        let invalid = |field: &str, e: &dyn std::fmt::Display| {
            ConfigError::ValidationError(format!("vault.{field}: {e}"))
        };
        Ok(VaultParams {
            asset: self.asset.clone(),
            underlying: self.underlying.clone(),
            decimals: self.decimals,
            is_put: self.is_put,
            cap: to_base_units("vault.cap", self.cap, self.decimals)?,
            minimum_supply: to_base_units("vault.minimum_supply", self.minimum_supply, self.decimals)?,
            management_fee: Rate::fee(self.management_fee)
                .map_err(|e| invalid("management_fee", &e))?,
            performance_fee: Rate::fee(self.performance_fee)
                .map_err(|e| invalid("performance_fee", &e))?,
            owner: AccountId::new(self.owner.clone()),
            keeper: AccountId::new(self.keeper.clone()),
            fee_recipient: AccountId::new(self.fee_recipient.clone()),
            premium_discount: Rate::discount(rollover.premium_discount).map_err(|e| {
                ConfigError::ValidationError(format!("rollover.premium_discount: {e}"))
            })?,
            auction_duration_secs: rollover.auction_duration_secs,
        })
    }
}

/// Convert a whole-token amount to base units.
///
/// Rejects negative amounts and amounts finer than one base unit.
pub fn to_base_units(field: &str, amount: Decimal, decimals: u8) -> Result<u128, ConfigError> {
    let error = |reason: &str| ConfigError::ValidationError(format!("{field}: {reason}"));
    if amount.is_sign_negative() {
        return Err(error("must not be negative"));
    }
    let scale = 10u128
        .checked_pow(u32::from(decimals))
        .and_then(Decimal::from_u128)
        .ok_or_else(|| error("decimals out of range"))?;
    let scaled = amount
        .checked_mul(scale)
        .ok_or_else(|| error("amount out of range"))?;
    if !scaled.fract().is_zero() {
        return Err(error("more precise than one base unit"));
    }
    scaled.to_u128().ok_or_else(|| error("amount out of range"))
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            underlying: default_underlying(),
            decimals: default_decimals(),
            is_put: default_is_put(),
            cap: default_cap(),
            minimum_supply: default_minimum_supply(),
            management_fee: default_management_fee(),
            performance_fee: default_performance_fee(),
            owner: default_owner(),
            keeper: default_keeper(),
            fee_recipient: default_fee_recipient(),
        }
    }
}

fn default_asset() -> String {
    "USDC".to_string()
}

fn default_underlying() -> String {
    "WETH".to_string()
}

const fn default_decimals() -> u8 {
    6
}

const fn default_is_put() -> bool {
    true
}

const fn default_cap() -> Decimal {
    dec!(1000000)
}

const fn default_minimum_supply() -> Decimal {
    dec!(0.01)
}

const fn default_management_fee() -> Decimal {
    dec!(0.02)
}

const fn default_performance_fee() -> Decimal {
    dec!(0.10)
}

fn default_owner() -> String {
    "owner".to_string()
}

fn default_keeper() -> String {
    "keeper".to_string()
}

fn default_fee_recipient() -> String {
    "treasury".to_string()
}
