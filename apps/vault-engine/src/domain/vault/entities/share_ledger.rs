//! Share balances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::shared::AccountId;
use crate::domain::vault::errors::VaultError;

/// Vault share supply split between depositor balances and shares the vault
/// itself holds (minted for pending deposits, or queued for withdrawal).
///
/// `total_supply == vault_held + Σ balances` at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: BTreeMap<AccountId, u128>,
    vault_held: u128,
    total_supply: u128,
}

impl ShareLedger {
    /// Empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            vault_held: 0,
            total_supply: 0,
        }
    }

    /// Total shares in existence.
    #[must_use]
    pub const fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Shares held by the vault.
    #[must_use]
    pub const fn vault_held(&self) -> u128 {
        self.vault_held
    }

    /// Shares held directly by `account`.
    #[must_use]
    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Mint new shares into the vault's own holding.
    pub fn mint_to_vault(&mut self, shares: u128) -> Result<(), VaultError> {
        self.total_supply = self
            .total_supply
            .checked_add(shares)
            .ok_or(VaultError::overflow("share mint"))?;
        self.vault_held = self
            .vault_held
            .checked_add(shares)
            .ok_or(VaultError::overflow("share mint"))?;
        Ok(())
    }

    /// Move vault-held shares to a depositor (redeem).
    pub fn release_from_vault(&mut self, to: &AccountId, shares: u128) -> Result<(), VaultError> {
        self.vault_held = self
            .vault_held
            .checked_sub(shares)
            .ok_or_else(|| VaultError::underflow("vault-held shares"))?;
        let balance = self.balances.entry(to.clone()).or_insert(0);
        *balance = balance
            .checked_add(shares)
            .ok_or(VaultError::overflow("share balance"))?;
        Ok(())
    }

    /// Move a depositor's shares into the vault (withdrawal queue).
    pub fn transfer_to_vault(&mut self, from: &AccountId, shares: u128) -> Result<(), VaultError> {
        let available = self.balance_of(from);
        if shares > available {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        let remaining = available - shares;
        if remaining == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(from.clone(), remaining);
        }
        self.vault_held = self
            .vault_held
            .checked_add(shares)
            .ok_or(VaultError::overflow("vault-held shares"))?;
        Ok(())
    }

    /// Burn shares held by the vault.
    pub fn burn_from_vault(&mut self, shares: u128) -> Result<(), VaultError> {
        self.vault_held = self
            .vault_held
            .checked_sub(shares)
            .ok_or_else(|| VaultError::underflow("vault-held shares"))?;
        self.total_supply = self
            .total_supply
            .checked_sub(shares)
            .ok_or_else(|| VaultError::underflow("total supply"))?;
        Ok(())
    }

    /// Accounts with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, u128)> {
        self.balances.iter().map(|(a, b)| (a, *b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn supply_is_consistent(ledger: &ShareLedger) -> bool {
        let held: u128 = ledger.holders().map(|(_, b)| b).sum();
        ledger.total_supply() == ledger.vault_held() + held
    }

    #[test]
    fn mint_release_transfer_burn_keeps_supply_consistent() {
        let mut ledger = ShareLedger::new();
        ledger.mint_to_vault(100).unwrap();
        ledger.release_from_vault(&alice(), 60).unwrap();
        assert!(supply_is_consistent(&ledger));

        ledger.transfer_to_vault(&alice(), 20).unwrap();
        ledger.burn_from_vault(20).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 40);
        assert_eq!(ledger.total_supply(), 80);
        assert!(supply_is_consistent(&ledger));
    }

    #[test]
    fn transfer_more_than_balance_fails() {
        let mut ledger = ShareLedger::new();
        ledger.mint_to_vault(10).unwrap();
        ledger.release_from_vault(&alice(), 10).unwrap();

        let Err(err) = ledger.transfer_to_vault(&alice(), 11) else {
            panic!("expected InsufficientShares");
        };
        assert_eq!(
            err,
            VaultError::InsufficientShares {
                requested: 11,
                available: 10
            }
        );
    }

    #[test]
    fn release_beyond_vault_holding_is_an_invariant_violation() {
        let mut ledger = ShareLedger::new();
        let Err(err) = ledger.release_from_vault(&alice(), 1) else {
            panic!("expected underflow");
        };
        assert!(matches!(err, VaultError::InvariantViolation(_)));
    }
}
