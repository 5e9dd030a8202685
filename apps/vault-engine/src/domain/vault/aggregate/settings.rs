//! Owner-controlled settings. Role checks live in the facade.

use rust_decimal::Decimal;

use super::Vault;
use crate::domain::shared::{AccountId, Rate};
use crate::domain::vault::entities::StrikeOverride;
use crate::domain::vault::errors::VaultError;
use crate::domain::vault::events::{SettingChanged, VaultEvent, VaultSetting};

/// Shortest auction the vault will open.
pub const MIN_AUCTION_DURATION_SECS: u64 = 300;

impl Vault {
    /// Set the deposit cap.
    ///
    /// # Errors
    ///
    /// `InvalidCap` for zero.
    pub fn set_cap(&mut self, cap: u128) -> Result<(), VaultError> {
        if cap == 0 {
            return Err(VaultError::InvalidCap);
        }
        let previous = std::mem::replace(&mut self.state.cap, cap);
        self.setting_changed(VaultSetting::Cap, previous.to_string(), cap.to_string());
        Ok(())
    }

    /// Set the annual management fee.
    ///
    /// # Errors
    ///
    /// `InvalidFee` outside `[0, 1)`.
    pub fn set_management_fee(&mut self, fee: Decimal) -> Result<(), VaultError> {
        let rate = fee_rate("management", fee)?;
        let previous = std::mem::replace(&mut self.state.management_fee, rate);
        self.setting_changed(
            VaultSetting::ManagementFee,
            previous.to_string(),
            rate.to_string(),
        );
        Ok(())
    }

    /// Set the performance fee.
    ///
    /// # Errors
    ///
    /// `InvalidFee` outside `[0, 1)`.
    pub fn set_performance_fee(&mut self, fee: Decimal) -> Result<(), VaultError> {
        let rate = fee_rate("performance", fee)?;
        let previous = std::mem::replace(&mut self.state.performance_fee, rate);
        self.setting_changed(
            VaultSetting::PerformanceFee,
            previous.to_string(),
            rate.to_string(),
        );
        Ok(())
    }

    /// Override the strike used by the next commit of the current round.
    ///
    /// # Errors
    ///
    /// `InvalidStrike` for zero or negative strikes.
    pub fn set_strike_price(&mut self, strike: Decimal) -> Result<(), VaultError> {
        if strike <= Decimal::ZERO {
            return Err(VaultError::InvalidStrike {
                strike: strike.to_string(),
            });
        }
        let previous = self
            .state
            .strike_override
            .replace(StrikeOverride {
                strike,
                round: self.state.round,
            })
            .map_or_else(|| "none".to_string(), |o| o.strike.to_string());
        self.setting_changed(VaultSetting::StrikeOverride, previous, strike.to_string());
        Ok(())
    }

    /// Replace the keeper.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` for an empty account.
    pub fn set_keeper(&mut self, keeper: AccountId) -> Result<(), VaultError> {
        require_account("keeper", &keeper)?;
        let current = keeper.to_string();
        let previous = std::mem::replace(&mut self.keeper, keeper);
        self.setting_changed(VaultSetting::Keeper, previous.to_string(), current);
        Ok(())
    }

    /// Replace the fee recipient.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` for an empty account or the current recipient.
    pub fn set_fee_recipient(&mut self, recipient: AccountId) -> Result<(), VaultError> {
        require_account("fee_recipient", &recipient)?;
        if recipient == self.fee_recipient {
            return Err(VaultError::InvalidSetting {
                setting: "fee_recipient",
                reason: "must differ from the current recipient".to_string(),
            });
        }
        let current = recipient.to_string();
        let previous = std::mem::replace(&mut self.fee_recipient, recipient);
        self.setting_changed(VaultSetting::FeeRecipient, previous.to_string(), current);
        Ok(())
    }

    /// Set the discount applied to the premium for the auction minimum price.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` outside `(0, 1]`.
    pub fn set_premium_discount(&mut self, discount: Decimal) -> Result<(), VaultError> {
        let rate = Rate::discount(discount).map_err(|e| VaultError::InvalidSetting {
            setting: "premium_discount",
            reason: e.to_string(),
        })?;
        let previous = std::mem::replace(&mut self.premium_discount, rate);
        self.setting_changed(
            VaultSetting::PremiumDiscount,
            previous.to_string(),
            rate.to_string(),
        );
        Ok(())
    }

    /// Set the auction duration.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` below [`MIN_AUCTION_DURATION_SECS`].
    pub fn set_auction_duration(&mut self, duration_secs: u64) -> Result<(), VaultError> {
        if duration_secs < MIN_AUCTION_DURATION_SECS {
            return Err(VaultError::InvalidSetting {
                setting: "auction_duration",
                reason: format!("must be at least {MIN_AUCTION_DURATION_SECS} seconds"),
            });
        }
        let previous = std::mem::replace(&mut self.auction_duration_secs, duration_secs);
        self.setting_changed(
            VaultSetting::AuctionDuration,
            previous.to_string(),
            duration_secs.to_string(),
        );
        Ok(())
    }

    fn setting_changed(&mut self, setting: VaultSetting, previous: String, current: String) {
        let round = self.state.round;
        tracing::info!(round, ?setting, %previous, %current, "Vault setting changed");
        self.events.push(VaultEvent::SettingChanged(SettingChanged {
            round,
            setting,
            previous,
            current,
        }));
    }
}

fn fee_rate(kind: &'static str, fee: Decimal) -> Result<Rate, VaultError> {
    Rate::fee(fee).map_err(|e| VaultError::InvalidFee {
        kind,
        reason: e.to_string(),
    })
}

fn require_account(setting: &'static str, account: &AccountId) -> Result<(), VaultError> {
    if account.as_str().trim().is_empty() {
        return Err(VaultError::InvalidSetting {
            setting,
            reason: "account must not be empty".to_string(),
        });
    }
    Ok(())
}
