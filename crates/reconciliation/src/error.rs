//! Reconciliation error types.

use common::Currency;
use domain::DomainError;
use gateway::GatewayError;
use ledger::LedgerError;
use thiserror::Error;

/// A declared payment failure.
///
/// These are expected outcomes (a declined operation, a blocked order, a
/// response that can't be booked). Inside the processor they are collected
/// per handler instead of aborting the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentFailure {
    /// The order is marked as fraud.
    #[error("Payment is marked as fraud, action is blocked.")]
    FraudBlocked,

    /// The order waits for a risk review decision.
    #[error("Risk decision needed, action is blocked.")]
    ReviewBlocked,

    /// The gateway declined an admin operation.
    #[error("The operation was declined. ({0})")]
    OperationDeclined(String),

    /// The gateway declined the customer's payment.
    #[error("The payment was declined. ({0})")]
    PaymentDeclined(String),

    /// The payment carries neither card details nor a funding type.
    #[error("Unknown transaction type")]
    UnknownTransactionType,

    /// The response lacks a field needed to book it.
    #[error("Incomplete gateway response: missing {0}")]
    IncompleteResponse(&'static str),

    /// No authorization exists for the order, at the gateway or locally.
    #[error("Authorization transaction not found.")]
    AuthorizationNotFound,

    /// The order was placed with another payment module.
    #[error("Order was not paid through the hosted gateway.")]
    NotPaidThroughGateway,

    /// The payment currency differs from the order's and no rate is known.
    #[error("No exchange rate from {from} to {to}")]
    MissingExchangeRate { from: Currency, to: Currency },

    /// A checkout return named another order than the one being paid.
    #[error("Invalid data (order): expected {expected}, got {actual}")]
    OrderReferenceMismatch { expected: String, actual: String },
}

impl PaymentFailure {
    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PaymentFailure::FraudBlocked => "fraud_blocked",
            PaymentFailure::ReviewBlocked => "review_blocked",
            PaymentFailure::OperationDeclined(_) => "operation_declined",
            PaymentFailure::PaymentDeclined(_) => "payment_declined",
            PaymentFailure::UnknownTransactionType => "unknown_transaction_type",
            PaymentFailure::IncompleteResponse(_) => "incomplete_response",
            PaymentFailure::AuthorizationNotFound => "authorization_not_found",
            PaymentFailure::NotPaidThroughGateway => "not_paid_through_gateway",
            PaymentFailure::MissingExchangeRate { .. } => "missing_exchange_rate",
            PaymentFailure::OrderReferenceMismatch { .. } => "order_reference_mismatch",
        }
    }
}

/// Outcome of one handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A declared failure; the processor records it and moves on.
    #[error(transparent)]
    Failure(#[from] PaymentFailure),

    /// Anything else; aborts the chain.
    #[error(transparent)]
    Fatal(DomainError),
}

impl From<DomainError> for HandlerError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::MissingExchangeRate { from, to } => {
                HandlerError::Failure(PaymentFailure::MissingExchangeRate { from, to })
            }
            other => HandlerError::Fatal(other),
        }
    }
}

impl From<LedgerError> for HandlerError {
    fn from(e: LedgerError) -> Self {
        HandlerError::Fatal(DomainError::Ledger(e))
    }
}

/// Failure messages collected during one processor run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerChainResult {
    failures: Vec<PaymentFailure>,
}

impl HandlerChainResult {
    /// Records a failure.
    pub fn push(&mut self, failure: PaymentFailure) {
        self.failures.push(failure);
    }

    /// Number of failures so far.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[PaymentFailure] {
        &self.failures
    }

    /// Failure messages in the order they occurred.
    pub fn messages(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }

    /// Ok when nothing failed, otherwise the aggregate failure.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ReconciliationError::Aggregate(self))
        }
    }
}

impl std::fmt::Display for HandlerChainResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.messages().join("\n"))
    }
}

/// Errors returned by reconciliation operations.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// A failure detected before any handler ran.
    #[error(transparent)]
    Payment(#[from] PaymentFailure),

    /// One or more handlers failed; the message joins all of them.
    #[error("{0}")]
    Aggregate(HandlerChainResult),

    /// The gateway call failed. The operation must be treated as not done.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Ledger error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl ReconciliationError {
    /// Returns true for declared failures, single or aggregated.
    pub fn is_declared_failure(&self) -> bool {
        matches!(
            self,
            ReconciliationError::Payment(_) | ReconciliationError::Aggregate(_)
        )
    }
}

/// Convenience type alias for reconciliation results.
pub type Result<T> = std::result::Result<T, ReconciliationError>;
