//! Currency conversion for payments made in a currency other than the order's.

use std::collections::HashMap;

use common::{Currency, Money};
use rust_decimal::Decimal;

use crate::{DomainError, Result};

/// Conversion rates relative to the shop's default currency.
///
/// A rate is how many units of a currency buy one unit of the default
/// currency. Converting between two non-default currencies goes through the
/// default currency.
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    base: Currency,
    rates: HashMap<Currency, Decimal>,
}

impl ExchangeRates {
    /// Creates a rate table with only the default currency.
    pub fn new(base: Currency) -> Self {
        Self {
            base,
            rates: HashMap::new(),
        }
    }

    /// Adds or replaces the rate of a currency.
    pub fn with_rate(mut self, currency: Currency, rate: Decimal) -> Self {
        self.rates.insert(currency, rate);
        self
    }

    /// Returns the default currency.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// Returns true when no foreign currency has a rate.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn rate(&self, currency: &Currency) -> Option<Decimal> {
        if *currency == self.base {
            return Some(Decimal::ONE);
        }
        self.rates
            .get(currency)
            .copied()
            .filter(|r| *r > Decimal::ZERO)
    }

    /// Converts an amount, rounding to the minor unit of the target currency.
    pub fn convert(&self, amount: Money, from: &Currency, to: &Currency) -> Result<Money> {
        if from == to {
            return Ok(amount);
        }

        let missing = || DomainError::MissingExchangeRate {
            from: from.clone(),
            to: to.clone(),
        };
        let from_rate = self.rate(from).ok_or_else(missing)?;
        let to_rate = self.rate(to).ok_or_else(missing)?;

        Ok(amount.convert(to_rate / from_rate).round_to(to))
    }
}
