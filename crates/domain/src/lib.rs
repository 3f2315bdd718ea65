//! Domain layer for payment reconciliation.
//!
//! This crate provides:
//! - the logical payment states an order moves through
//! - the mapping from those states onto host state identifiers
//! - the order service that applies state changes and payments
//! - exchange rates used when a payment is made in a foreign currency

pub mod error;
pub mod order;
pub mod rates;

pub use error::{DomainError, Result};
pub use order::{
    CustomerNotifier, InMemoryOrderRepository, LogNotifier, Order, OrderRepository, OrderService,
    OrderState, PAYMENT_MODULE, StateMapping,
};
pub use rates::ExchangeRates;
