//! Domain error types.

use common::{Currency, OrderId, StateId};
use ledger::LedgerError;
use thiserror::Error;

use crate::order::OrderState;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the ledger.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The state mapping has no identifier for a logical state.
    #[error("No host state configured for {0}")]
    UnmappedState(OrderState),

    /// Two logical states were mapped onto the same host identifier.
    #[error("Host state {id} is mapped to both {first} and {second}")]
    DuplicateStateId {
        id: StateId,
        first: OrderState,
        second: OrderState,
    },

    /// No exchange rate is known for a currency.
    #[error("No exchange rate from {from} to {to}")]
    MissingExchangeRate { from: Currency, to: Currency },

    /// The customer could not be notified of a state change.
    #[error("Notification failed: {0}")]
    Notification(String),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
