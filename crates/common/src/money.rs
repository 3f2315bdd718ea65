//! Monetary amounts and currency codes.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Most decimal places an amount keeps. No ISO 4217 currency uses more.
const MAX_SCALE: u32 = 4;

/// Errors raised when parsing amounts or currency codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyParseError {
    /// The amount is not a finite decimal number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The currency is not a three-letter ISO 4217 code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
}

/// Exact decimal money amount.
///
/// The value carries no currency of its own: precision only matters when an
/// amount is rounded or formatted for a currency, see [`Money::round_to`]
/// and [`Money::format_in`].
///
/// On the wire the gateway exchanges amounts as decimal numbers (`10.5`) or
/// decimal strings (`"10.50"`); both deserialize into the same value and
/// amounts always serialize back as a decimal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money {
    amount: Decimal,
}

impl Money {
    /// Creates an amount from a decimal value.
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount: amount.round_dp_with_strategy(MAX_SCALE, RoundingStrategy::MidpointAwayFromZero),
        }
    }

    /// Creates an amount from hundredths.
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2))
    }

    /// Creates an amount from the minor units of a currency.
    pub fn from_minor_units(units: i64, currency: &Currency) -> Self {
        Self::new(Decimal::new(units, currency.decimals()))
    }

    /// Creates an amount from a float as the gateway wrote it.
    ///
    /// Goes through the shortest decimal form of the float, so `10.125`
    /// stays `10.125`. Returns None for NaN, infinities and values out of
    /// range.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_str(&value.to_string()).ok().map(Self::new)
    }

    /// Parses a decimal string such as `"10.00"`.
    pub fn parse(value: &str) -> Result<Self, MoneyParseError> {
        let trimmed = value.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Self::new)
            .map_err(|_| MoneyParseError::InvalidAmount(value.to_string()))
    }

    /// Returns zero.
    pub fn zero() -> Self {
        Self {
            amount: Decimal::ZERO,
        }
    }

    /// Returns the decimal value.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the amount as a float, for JSON output.
    pub fn to_f64(&self) -> f64 {
        self.amount.to_f64().unwrap_or_default()
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Rounds half away from zero to the minor unit of a currency.
    pub fn round_to(&self, currency: &Currency) -> Money {
        Money {
            amount: self
                .amount
                .round_dp_with_strategy(currency.decimals(), RoundingStrategy::MidpointAwayFromZero),
        }
    }

    /// Formats the amount with exactly the decimals of a currency.
    pub fn format_in(&self, currency: &Currency) -> String {
        let decimals = currency.decimals() as usize;
        format!("{:.*}", decimals, self.round_to(currency).amount)
    }

    /// Multiplies by a conversion rate.
    pub fn convert(&self, rate: Decimal) -> Money {
        Money::new(self.amount * rate)
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money::new(self.amount * Decimal::from(quantity))
    }

    /// Splits the amount over `quantity` units, rounding each share up to
    /// the minor unit of a currency.
    pub fn divide_up(&self, quantity: u32, currency: &Currency) -> Money {
        if quantity == 0 {
            return *self;
        }
        let share = self.amount / Decimal::from(quantity);
        Money::new(share.round_dp_with_strategy(currency.decimals(), RoundingStrategy::AwayFromZero))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let amount = self.amount.normalize();
        if amount.scale() < 2 {
            write!(f, "{:.2}", amount)
        } else {
            write!(f, "{}", amount)
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            amount: self.amount + rhs.amount,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            amount: self.amount - rhs.amount,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.amount += rhs.amount;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.amount -= rhs.amount;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_f64(v).ok_or_else(|| E::custom(MoneyParseError::InvalidAmount(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money::new(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money::new(Decimal::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// ISO 4217 alphabetic currency code, stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

/// US dollars.
impl Default for Currency {
    fn default() -> Self {
        Self("USD".to_string())
    }
}

impl Currency {
    /// Parses and normalizes a currency code.
    pub fn parse(code: &str) -> Result<Self, MoneyParseError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MoneyParseError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal places of the currency's minor unit.
    pub fn decimals(&self) -> u32 {
        match self.0.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "UYI" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::parse(s)
    }
}
