//! Shared value types used across the payment reconciliation crates.

pub mod money;
pub mod types;

pub use money::{Currency, Money, MoneyParseError};
pub use types::{CartId, OrderId, StateId};
