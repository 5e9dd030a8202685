//! Deposit/Redemption Engine.

use super::Vault;
use crate::domain::shared::AccountId;
use crate::domain::vault::entities::{DepositReceipt, Withdrawal};
use crate::domain::vault::errors::VaultError;
use crate::domain::vault::events::{
    Deposited, InstantWithdrawn, Redeemed, VaultEvent, WithdrawalCompleted, WithdrawalInitiated,
};
use crate::domain::vault::services::ShareMath;

impl Vault {
    /// Deposit `amount` for `creditor` into the current round.
    ///
    /// # Errors
    ///
    /// `ZeroAmount`, `CapExceeded`, or `BelowMinimumSupply` on the first
    /// deposit into an empty vault.
    pub fn deposit(&mut self, creditor: &AccountId, amount: u128) -> Result<(), VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount { field: "amount" });
        }

        let balance = self.state.total_balance();
        let new_balance = balance
            .checked_add(amount)
            .ok_or(VaultError::overflow("deposit"))?;
        if new_balance > self.state.cap {
            return Err(VaultError::CapExceeded {
                amount,
                cap: self.state.cap,
                balance,
            });
        }

        if self.shares.total_supply() == 0 {
            let unit = ShareMath::unit(self.decimals)?;
            let shares = ShareMath::asset_to_shares(amount, unit, self.decimals)?;
            if shares < self.state.minimum_supply {
                return Err(VaultError::BelowMinimumSupply {
                    shares,
                    minimum: self.state.minimum_supply,
                });
            }
        }

        let receipt = self.materialized_receipt(creditor)?;
        let round = self.state.round;
        let pending = if receipt.round == round {
            receipt
                .amount
                .checked_add(amount)
                .ok_or(VaultError::overflow("pending deposit"))?
        } else {
            amount
        };
        let total_pending = self
            .state
            .total_pending
            .checked_add(amount)
            .ok_or(VaultError::overflow("total pending"))?;

        self.receipts.insert(
            creditor.clone(),
            DepositReceipt {
                round,
                amount: pending,
                unredeemed_shares: receipt.unredeemed_shares,
            },
        );
        self.state.total_pending = total_pending;
        self.state.free_balance = new_balance - self.state.locked_amount;

        tracing::debug!(account = %creditor, amount, round, "Deposit accepted");
        self.events.push(VaultEvent::Deposited(Deposited {
            account: creditor.clone(),
            amount,
            round,
        }));
        Ok(())
    }

    /// Refund part of a pending deposit made in the current round.
    ///
    /// # Errors
    ///
    /// `ZeroAmount`, `InvalidRound` once the deposit's round has closed, or
    /// `InsufficientPending`.
    pub fn withdraw_instantly(
        &mut self,
        account: &AccountId,
        amount: u128,
    ) -> Result<u128, VaultError> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount { field: "amount" });
        }
        let round = self.state.round;
        let Some(receipt) = self.receipts.get(account).copied() else {
            return Err(VaultError::InvalidRound {
                receipt_round: 0,
                vault_round: round,
            });
        };
        if receipt.round != round {
            return Err(VaultError::InvalidRound {
                receipt_round: receipt.round,
                vault_round: round,
            });
        }
        if amount > receipt.amount {
            return Err(VaultError::InsufficientPending {
                requested: amount,
                pending: receipt.amount,
            });
        }

        let total_pending = self
            .state
            .total_pending
            .checked_sub(amount)
            .ok_or_else(|| VaultError::underflow("total pending"))?;
        let free_balance = self
            .state
            .free_balance
            .checked_sub(amount)
            .ok_or_else(|| VaultError::underflow("free balance"))?;

        self.receipts.insert(
            account.clone(),
            DepositReceipt {
                amount: receipt.amount - amount,
                ..receipt
            },
        );
        self.state.total_pending = total_pending;
        self.state.free_balance = free_balance;

        tracing::debug!(account = %account, amount, round, "Instant withdrawal");
        self.events
            .push(VaultEvent::InstantWithdrawn(InstantWithdrawn {
                account: account.clone(),
                amount,
                round,
            }));
        Ok(amount)
    }

    /// Redeem `shares` of the account's unredeemed shares into its balance.
    ///
    /// # Errors
    ///
    /// `ZeroAmount` or `InsufficientShares`.
    pub fn redeem(&mut self, account: &AccountId, shares: u128) -> Result<u128, VaultError> {
        if shares == 0 {
            return Err(VaultError::ZeroAmount { field: "shares" });
        }
        self.redeem_shares(account, Some(shares))
    }

    /// Redeem everything redeemable. A second call in the same round is a no-op.
    pub fn max_redeem(&mut self, account: &AccountId) -> Result<u128, VaultError> {
        self.redeem_shares(account, None)
    }

    fn redeem_shares(
        &mut self,
        account: &AccountId,
        requested: Option<u128>,
    ) -> Result<u128, VaultError> {
        let receipt = self.materialized_receipt(account)?;
        let available = receipt.unredeemed_shares;
        let shares = requested.unwrap_or(available);
        if shares > available {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        if shares == 0 {
            return Ok(0);
        }

        self.shares.release_from_vault(account, shares)?;
        self.receipts.insert(
            account.clone(),
            DepositReceipt {
                unredeemed_shares: available - shares,
                ..receipt
            },
        );

        let round = self.state.round;
        tracing::debug!(account = %account, shares, round, "Shares redeemed");
        self.events.push(VaultEvent::Redeemed(Redeemed {
            account: account.clone(),
            shares,
            round,
        }));
        Ok(shares)
    }

    /// Queue `shares` for withdrawal at the current round's closing price.
    ///
    /// Redeems all available shares first. A withdrawal already open in the
    /// current round is topped up.
    ///
    /// # Errors
    ///
    /// `ZeroAmount`, `ExistingWithdrawal` for an open withdrawal from an
    /// earlier round, or `InsufficientShares`.
    pub fn initiate_withdraw(&mut self, account: &AccountId, shares: u128) -> Result<(), VaultError> {
        if shares == 0 {
            return Err(VaultError::ZeroAmount { field: "shares" });
        }

        self.redeem_shares(account, None)?;

        let round = self.state.round;
        let existing = match self.withdrawals.get(account) {
            Some(w) if w.round != round => {
                return Err(VaultError::ExistingWithdrawal { round: w.round });
            }
            Some(w) => w.shares,
            None => 0,
        };

        let queued = existing
            .checked_add(shares)
            .ok_or(VaultError::overflow("withdrawal shares"))?;
        let queued_total = self
            .state
            .queued_withdraw_shares
            .checked_add(shares)
            .ok_or(VaultError::overflow("queued withdraw shares"))?;
        let queued_current = self
            .state
            .current_queued_withdraw_shares
            .checked_add(shares)
            .ok_or(VaultError::overflow("current queued withdraw shares"))?;

        self.shares.transfer_to_vault(account, shares)?;
        self.withdrawals.insert(
            account.clone(),
            Withdrawal {
                round,
                shares: queued,
            },
        );
        self.state.queued_withdraw_shares = queued_total;
        self.state.current_queued_withdraw_shares = queued_current;

        tracing::debug!(account = %account, shares, round, "Withdrawal initiated");
        self.events
            .push(VaultEvent::WithdrawalInitiated(WithdrawalInitiated {
                account: account.clone(),
                shares,
                round,
            }));
        Ok(())
    }

    /// Pay out a withdrawal queued in an already-closed round.
    ///
    /// # Errors
    ///
    /// `WithdrawalNotInitiated`, `RoundNotClosed`, or `ZeroAmount` when the
    /// shares are worth nothing at their round's price.
    pub fn complete_withdraw(&mut self, account: &AccountId) -> Result<u128, VaultError> {
        let withdrawal = match self.withdrawals.get(account) {
            Some(w) if w.shares > 0 => *w,
            _ => return Err(VaultError::WithdrawalNotInitiated),
        };
        if withdrawal.round >= self.state.round {
            return Err(VaultError::RoundNotClosed {
                round: withdrawal.round,
            });
        }

        let price = self.price_history.require(withdrawal.round)?;
        let amount = ShareMath::shares_to_asset(withdrawal.shares, price, self.decimals)?;
        if amount == 0 {
            return Err(VaultError::ZeroAmount {
                field: "withdraw amount",
            });
        }

        let queued_total = self
            .state
            .queued_withdraw_shares
            .checked_sub(withdrawal.shares)
            .ok_or_else(|| VaultError::underflow("queued withdraw shares"))?;
        let reserved = self
            .state
            .last_queued_withdraw_amount
            .checked_sub(amount)
            .ok_or_else(|| VaultError::underflow("queued withdraw amount"))?;
        let free_balance = self
            .state
            .free_balance
            .checked_sub(amount)
            .ok_or_else(|| VaultError::underflow("free balance"))?;

        self.shares.burn_from_vault(withdrawal.shares)?;
        self.withdrawals.remove(account);
        self.state.queued_withdraw_shares = queued_total;
        self.state.last_queued_withdraw_amount = reserved;
        self.state.free_balance = free_balance;

        tracing::debug!(
            account = %account,
            shares = withdrawal.shares,
            amount,
            round = withdrawal.round,
            "Withdrawal completed"
        );
        self.events
            .push(VaultEvent::WithdrawalCompleted(WithdrawalCompleted {
                account: account.clone(),
                shares: withdrawal.shares,
                amount,
                round: withdrawal.round,
            }));
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::super::vault::test_support::*;
    use super::*;
    use crate::domain::vault::services::ShareMath;

    /// Close the current round with no option activity.
    fn close_flat(vault: &mut Vault) {
        vault.close_round_for_test().unwrap();
    }

    #[test]
    fn deposit_accumulates_pending() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        vault.deposit(&alice(), 50 * UNIT).unwrap();

        let receipt = vault.receipt(&alice()).unwrap();
        assert_eq!(receipt.amount, 150 * UNIT);
        assert_eq!(receipt.round, 1);
        assert_eq!(vault.state().total_pending, 150 * UNIT);
        assert_eq!(vault.state().free_balance, 150 * UNIT);
        assert_eq!(vault.pending_events().len(), 2);
    }

    #[test]
    fn zero_deposit_is_rejected() {
        let mut vault = vault();
        assert_eq!(
            vault.deposit(&alice(), 0),
            Err(VaultError::ZeroAmount { field: "amount" })
        );
    }

    #[test]
    fn deposit_over_cap_is_rejected_without_change() {
        let mut p = params();
        p.cap = 100 * UNIT;
        let mut vault = Vault::new(p).unwrap();
        vault.deposit(&alice(), 60 * UNIT).unwrap();

        let Err(err) = vault.deposit(&bob(), 41 * UNIT) else {
            panic!("expected CapExceeded");
        };
        assert!(matches!(err, VaultError::CapExceeded { .. }));
        assert_eq!(vault.state().total_pending, 60 * UNIT);
        assert!(vault.receipt(&bob()).is_none());
    }

    #[test]
    fn dust_guard_on_empty_vault() {
        let mut vault = vault();
        let minimum = vault.state().minimum_supply;

        assert!(matches!(
            vault.deposit(&alice(), minimum - 1),
            Err(VaultError::BelowMinimumSupply { .. })
        ));
        vault.deposit(&alice(), minimum).unwrap();
        assert_eq!(vault.receipt(&alice()).unwrap().amount, minimum);
    }

    #[test]
    fn dust_guard_only_applies_while_supply_is_zero() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);
        assert!(vault.share_ledger().total_supply() > 0);
        vault.deposit(&bob(), 1).unwrap();
    }

    #[test]
    fn instant_withdraw_returns_exact_amount() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();

        assert_eq!(vault.withdraw_instantly(&alice(), 100 * UNIT).unwrap(), 100 * UNIT);
        assert_eq!(vault.state().total_pending, 0);
        assert_eq!(vault.state().free_balance, 0);
        assert_eq!(vault.receipt(&alice()).unwrap().amount, 0);
    }

    #[test]
    fn instant_withdraw_fails_after_close() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);

        assert_eq!(
            vault.withdraw_instantly(&alice(), UNIT),
            Err(VaultError::InvalidRound {
                receipt_round: 1,
                vault_round: 2
            })
        );
    }

    #[test]
    fn instant_withdraw_over_pending_fails() {
        let mut vault = vault();
        vault.deposit(&alice(), 10 * UNIT).unwrap();
        assert!(matches!(
            vault.withdraw_instantly(&alice(), 11 * UNIT),
            Err(VaultError::InsufficientPending { .. })
        ));
    }

    #[test]
    fn redeem_after_close_moves_shares_to_holder() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);

        assert_eq!(vault.redeem(&alice(), 40 * UNIT).unwrap(), 40 * UNIT);
        assert_eq!(vault.share_balances(&alice()).unwrap(), (40 * UNIT, 60 * UNIT));
    }

    #[test]
    fn redeem_more_than_available_fails() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);

        assert!(matches!(
            vault.redeem(&alice(), 101 * UNIT),
            Err(VaultError::InsufficientShares { .. })
        ));
    }

    #[test]
    fn redeem_in_deposit_round_has_nothing_available() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        assert!(matches!(
            vault.redeem(&alice(), 1),
            Err(VaultError::InsufficientShares { available: 0, .. })
        ));
    }

    #[test]
    fn max_redeem_is_idempotent() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);

        assert_eq!(vault.max_redeem(&alice()).unwrap(), 100 * UNIT);
        vault.drain_events();
        assert_eq!(vault.max_redeem(&alice()).unwrap(), 0);
        assert!(vault.pending_events().is_empty());
        assert_eq!(vault.share_balances(&alice()).unwrap(), (100 * UNIT, 0));
    }

    #[test]
    fn initiate_withdraw_force_redeems_then_queues() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);

        vault.initiate_withdraw(&alice(), 30 * UNIT).unwrap();

        assert_eq!(vault.share_balances(&alice()).unwrap(), (70 * UNIT, 0));
        assert_eq!(vault.withdrawal(&alice()).unwrap().shares, 30 * UNIT);
        assert_eq!(vault.state().queued_withdraw_shares, 30 * UNIT);
        assert_eq!(vault.state().current_queued_withdraw_shares, 30 * UNIT);
    }

    #[test]
    fn initiate_withdraw_tops_up_in_same_round() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);

        vault.initiate_withdraw(&alice(), 30 * UNIT).unwrap();
        vault.initiate_withdraw(&alice(), 20 * UNIT).unwrap();
        assert_eq!(vault.withdrawal(&alice()).unwrap().shares, 50 * UNIT);
    }

    #[test]
    fn initiate_withdraw_rejects_open_withdrawal_from_earlier_round() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);
        vault.initiate_withdraw(&alice(), 30 * UNIT).unwrap();
        close_flat(&mut vault);

        assert_eq!(
            vault.initiate_withdraw(&alice(), 10 * UNIT),
            Err(VaultError::ExistingWithdrawal { round: 2 })
        );
    }

    #[test]
    fn initiate_withdraw_over_balance_fails() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);
        assert!(matches!(
            vault.initiate_withdraw(&alice(), 101 * UNIT),
            Err(VaultError::InsufficientShares { .. })
        ));
    }

    #[test]
    fn complete_withdraw_requires_a_close() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);
        vault.initiate_withdraw(&alice(), 100 * UNIT).unwrap();

        assert_eq!(
            vault.complete_withdraw(&alice()),
            Err(VaultError::RoundNotClosed { round: 2 })
        );
    }

    #[test]
    fn complete_withdraw_pays_round_price_and_clears_record() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);
        vault.initiate_withdraw(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);

        let price = vault.price_history().price_at(2).unwrap();
        let expected = ShareMath::shares_to_asset(100 * UNIT, price, DECIMALS).unwrap();
        assert_eq!(vault.complete_withdraw(&alice()).unwrap(), expected);

        assert!(vault.withdrawal(&alice()).is_none());
        assert_eq!(vault.state().queued_withdraw_shares, 0);
        assert_eq!(vault.share_ledger().total_supply(), 0);
        assert_eq!(
            vault.complete_withdraw(&alice()),
            Err(VaultError::WithdrawalNotInitiated)
        );
    }

    #[test]
    fn complete_withdraw_without_initiation_fails() {
        let mut vault = vault();
        assert_eq!(
            vault.complete_withdraw(&alice()),
            Err(VaultError::WithdrawalNotInitiated)
        );
    }

    #[test]
    fn deposit_in_later_round_collapses_old_pending() {
        let mut vault = vault();
        vault.deposit(&alice(), 100 * UNIT).unwrap();
        close_flat(&mut vault);
        vault.deposit(&alice(), 10 * UNIT).unwrap();

        let receipt = vault.receipt(&alice()).unwrap();
        assert_eq!(receipt.round, 2);
        assert_eq!(receipt.amount, 10 * UNIT);
        assert_eq!(receipt.unredeemed_shares, 100 * UNIT);
    }
}
