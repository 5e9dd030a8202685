//! Receipt collapse.

use super::ShareMath;
use crate::domain::vault::entities::{DepositReceipt, RoundPriceHistory};
use crate::domain::vault::errors::VaultError;

/// Convert a stale pending deposit into unredeemed shares.
///
/// A receipt whose `round` is earlier than `current_round` still carrying a
/// pending `amount` is priced at the closing price of its round. Receipts of
/// the current round are returned unchanged. Pure: the caller stores the
/// result.
///
/// # Errors
///
/// `MissingRoundPrice` if the receipt's round has no recorded price, or a
/// share-math error.
pub fn materialize(
    receipt: &DepositReceipt,
    history: &RoundPriceHistory,
    current_round: u64,
    decimals: u8,
) -> Result<DepositReceipt, VaultError> {
    if receipt.round >= current_round || receipt.amount == 0 {
        return Ok(*receipt);
    }

    let price = history.require(receipt.round)?;
    let converted = ShareMath::asset_to_shares(receipt.amount, price, decimals)?;
    let unredeemed_shares = receipt
        .unredeemed_shares
        .checked_add(converted)
        .ok_or(VaultError::overflow("unredeemed shares"))?;

    Ok(DepositReceipt {
        round: receipt.round,
        amount: 0,
        unredeemed_shares,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(prices: &[u128]) -> RoundPriceHistory {
        let mut history = RoundPriceHistory::new();
        for (i, price) in prices.iter().enumerate() {
            history.record(i as u64 + 1, *price).unwrap();
        }
        history
    }

    #[test]
    fn current_round_receipt_is_untouched() {
        let receipt = DepositReceipt::pending(2, 500);
        let collapsed = materialize(&receipt, &history(&[1_000_000]), 2, 6).unwrap();
        assert_eq!(collapsed, receipt);
    }

    #[test]
    fn stale_receipt_converts_at_its_round_price() {
        let receipt = DepositReceipt {
            round: 2,
            amount: 1_000_000,
            unredeemed_shares: 7,
        };
        // round 2 closed at 1.25
        let prices = history(&[1_000_000, 1_250_000, 2_000_000]);
        let collapsed = materialize(&receipt, &prices, 4, 6).unwrap();

        assert_eq!(collapsed.amount, 0);
        assert_eq!(collapsed.unredeemed_shares, 7 + 800_000);
        assert_eq!(collapsed.round, 2);
    }

    #[test]
    fn collapse_is_idempotent() {
        let receipt = DepositReceipt::pending(1, 1_000);
        let prices = history(&[1_000_000]);
        let once = materialize(&receipt, &prices, 2, 6).unwrap();
        let twice = materialize(&once, &prices, 2, 6).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_price_is_an_error() {
        let receipt = DepositReceipt::pending(1, 1_000);
        assert_eq!(
            materialize(&receipt, &RoundPriceHistory::new(), 2, 6),
            Err(VaultError::MissingRoundPrice { round: 1 })
        );
    }
}
