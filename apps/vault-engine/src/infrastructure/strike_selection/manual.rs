//! Fixed strike and premium, adjustable at runtime.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{SelectorError, StrikeSelectorPort};
use crate::domain::shared::Timestamp;

#[derive(Debug, Clone, Copy)]
struct Quote {
    strike: Decimal,
    premium: Decimal,
}

/// Strike selector returning operator-supplied values.
#[derive(Debug)]
pub struct ManualStrikeSelector {
    quote: RwLock<Quote>,
}

impl ManualStrikeSelector {
    /// Create a selector quoting `strike` and `premium`.
    #[must_use]
    pub const fn new(strike: Decimal, premium: Decimal) -> Self {
        Self {
            quote: RwLock::new(Quote { strike, premium }),
        }
    }

    /// Change the quoted strike.
    pub fn set_strike(&self, strike: Decimal) {
        self.quote
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .strike = strike;
    }

    /// Change the quoted premium.
    pub fn set_premium(&self, premium: Decimal) {
        self.quote
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .premium = premium;
    }

    fn current(&self) -> Quote {
        *self.quote.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StrikeSelectorPort for ManualStrikeSelector {
    async fn get_strike_price(
        &self,
        _expiry: Timestamp,
        _is_put: bool,
    ) -> Result<Decimal, SelectorError> {
        Ok(self.current().strike)
    }

    async fn get_premium(
        &self,
        _strike: Decimal,
        _expiry: Timestamp,
        _is_put: bool,
    ) -> Result<Decimal, SelectorError> {
        Ok(self.current().premium)
    }
}
