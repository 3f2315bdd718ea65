//! Logical payment states.

use serde::{Deserialize, Serialize};

/// The payment state of an order.
///
/// These are logical states; the host persists each one under its own
/// identifier, resolved through a [`StateMapping`](super::StateMapping).
///
/// Typical transitions:
/// ```text
/// AwaitingPayment ──► Authorized ──► PaymentAccepted ──► PartiallyRefunded ──► Refunded
///       │  ▲              │                 │
///       │  │              └──► Canceled     └──► Refunded
///       ▼  │
/// ReviewRequired ──► Fraud
///
/// any failed chain ──► Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    /// Order placed, no payment outcome yet.
    AwaitingPayment,

    /// Funds are held and can be captured or voided.
    Authorized,

    /// Funds have been captured.
    PaymentAccepted,

    /// Authorization voided or payment cancelled.
    Canceled,

    /// Fully refunded.
    Refunded,

    /// Part of the captured amount was refunded.
    PartiallyRefunded,

    /// The gateway's risk screening wants a merchant decision.
    ReviewRequired,

    /// Rejected by risk screening.
    Fraud,

    /// A payment operation failed.
    Error,
}

impl OrderState {
    /// Every logical state.
    pub const ALL: [OrderState; 9] = [
        OrderState::AwaitingPayment,
        OrderState::Authorized,
        OrderState::PaymentAccepted,
        OrderState::Canceled,
        OrderState::Refunded,
        OrderState::PartiallyRefunded,
        OrderState::ReviewRequired,
        OrderState::Fraud,
        OrderState::Error,
    ];

    /// Returns true if payment actions are blocked in this state.
    pub fn blocks_actions(&self) -> bool {
        matches!(self, OrderState::Fraud | OrderState::ReviewRequired)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::AwaitingPayment => "AWAITING_PAYMENT",
            OrderState::Authorized => "AUTHORIZED",
            OrderState::PaymentAccepted => "PAYMENT_ACCEPTED",
            OrderState::Canceled => "CANCELED",
            OrderState::Refunded => "REFUNDED",
            OrderState::PartiallyRefunded => "PARTIALLY_REFUNDED",
            OrderState::ReviewRequired => "REVIEW_REQUIRED",
            OrderState::Fraud => "FRAUD",
            OrderState::Error => "ERROR",
        }
    }

    /// Parses a state name as returned by [`as_str`](Self::as_str).
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
