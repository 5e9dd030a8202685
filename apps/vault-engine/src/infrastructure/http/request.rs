//! HTTP request DTOs.
//!
//! Every mutating request names its `caller`. The account is trusted as sent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::AccountId;
use crate::error::ApiError;

/// Parse a non-empty account name.
pub fn parse_account(field: &'static str, raw: &str) -> Result<AccountId, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid_request(format!("{field} must not be empty"))
            .with_context("field", field));
    }
    Ok(AccountId::new(trimmed))
}

/// Request carrying only the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerRequest {
    /// Calling account.
    pub caller: String,
}

/// Deposit or instant-withdraw request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRequest {
    /// Calling account.
    pub caller: String,
    /// Asset amount in base units.
    pub amount: u128,
}

/// Deposit on behalf of another account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositForRequest {
    /// Calling account.
    pub caller: String,
    /// Asset amount in base units.
    pub amount: u128,
    /// Account credited with the deposit.
    pub beneficiary: String,
}

/// Redeem or initiate-withdraw request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharesRequest {
    /// Calling account.
    pub caller: String,
    /// Share amount.
    pub shares: u128,
}

/// Set the deposit cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCapRequest {
    /// Calling account.
    pub caller: String,
    /// New cap in base units.
    pub cap: u128,
}

/// Set the management or performance fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetFeeRequest {
    /// Calling account.
    pub caller: String,
    /// Fee as a fraction, e.g. `"0.02"`.
    pub fee: Decimal,
}

/// Override the next strike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStrikeRequest {
    /// Calling account.
    pub caller: String,
    /// Strike price.
    pub strike: Decimal,
}

/// Replace the keeper or the fee recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAccountRequest {
    /// Calling account.
    pub caller: String,
    /// New account.
    pub account: String,
}

/// Set the premium discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDiscountRequest {
    /// Calling account.
    pub caller: String,
    /// Discount factor in `(0, 1]`.
    pub discount: Decimal,
}

/// Set the auction duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDurationRequest {
    /// Calling account.
    pub caller: String,
    /// Duration in seconds.
    pub duration_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_account_is_rejected() {
        let Err(err) = parse_account("caller", "   ") else {
            panic!("expected invalid request");
        };
        assert_eq!(err.to_string(), "[INVALID_REQUEST] caller must not be empty");
        assert_eq!(parse_account("caller", " alice ").unwrap().as_str(), "alice");
    }

    #[test]
    fn amounts_accept_large_integers() {
        let json = r#"{"caller": "alice", "amount": 340282366920938463463374607431768211455}"#;
        let req: AmountRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.amount, u128::MAX);
    }

    #[test]
    fn fees_parse_from_strings() {
        let req: SetFeeRequest =
            serde_json::from_str(r#"{"caller": "owner", "fee": "0.025"}"#).unwrap();
        assert_eq!(req.fee, dec!(0.025));
    }
}
