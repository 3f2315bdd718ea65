use async_trait::async_trait;
use common::Money;

use crate::{
    LedgerError, OrderId, PaymentRecord, RecordId, RefundRecord, Result, StateHistoryEntry,
    VoidRecord,
};

/// Core trait for ledger implementations.
///
/// All implementations must be thread-safe (Send + Sync). Reads return
/// records in insertion order (oldest first).
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Stores a payment record.
    async fn record_payment(&self, payment: PaymentRecord) -> Result<()>;

    /// Retrieves all payments recorded for an order.
    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>>;

    /// Finds the payment an order recorded for a gateway transaction.
    async fn find_payment(
        &self,
        order_id: OrderId,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>>;

    /// Removes a payment record. Returns false if it did not exist.
    async fn delete_payment(&self, id: RecordId) -> Result<bool>;

    /// Appends a refund record.
    async fn append_refund(&self, refund: RefundRecord) -> Result<()>;

    /// Retrieves all refunds recorded for an order.
    async fn refunds_for_order(&self, order_id: OrderId) -> Result<Vec<RefundRecord>>;

    /// Appends a void record.
    async fn append_void(&self, void: VoidRecord) -> Result<()>;

    /// Retrieves all voids recorded for an order.
    async fn voids_for_order(&self, order_id: OrderId) -> Result<Vec<VoidRecord>>;

    /// Appends a state history entry.
    async fn append_history(&self, entry: StateHistoryEntry) -> Result<()>;

    /// Retrieves the state history of an order.
    async fn history_for_order(&self, order_id: OrderId) -> Result<Vec<StateHistoryEntry>>;
}

/// Extension trait providing convenience queries for ledgers.
#[async_trait]
pub trait LedgerExt: Ledger {
    /// Checks if any refund has been recorded for an order.
    async fn has_refunds(&self, order_id: OrderId) -> Result<bool> {
        Ok(!self.refunds_for_order(order_id).await?.is_empty())
    }

    /// Checks if a full (non credit-note) refund has been recorded for an order.
    async fn has_full_refund(&self, order_id: OrderId) -> Result<bool> {
        Ok(self
            .refunds_for_order(order_id)
            .await?
            .iter()
            .any(RefundRecord::is_full_refund))
    }

    /// Sums all refunds recorded for an order.
    async fn refunded_total(&self, order_id: OrderId) -> Result<Money> {
        Ok(self
            .refunds_for_order(order_id)
            .await?
            .iter()
            .map(|r| r.total)
            .sum())
    }

    /// Checks if any void has been recorded for an order.
    async fn has_voids(&self, order_id: OrderId) -> Result<bool> {
        Ok(!self.voids_for_order(order_id).await?.is_empty())
    }
}

// Blanket implementation for all Ledger implementations
impl<T: Ledger + ?Sized> LedgerExt for T {}

/// Validates a payment before it is stored.
pub fn validate_payment(payment: &PaymentRecord) -> Result<()> {
    if payment.transaction_id.trim().is_empty() {
        return Err(LedgerError::InvalidRecord(
            "payment transaction id is empty".to_string(),
        ));
    }
    if payment.amount.is_negative() {
        return Err(LedgerError::InvalidRecord(format!(
            "payment amount {} is negative",
            payment.amount
        )));
    }
    Ok(())
}

/// Validates a refund before it is appended.
pub fn validate_refund(refund: &RefundRecord) -> Result<()> {
    if refund.transaction_id.trim().is_empty() {
        return Err(LedgerError::InvalidRecord(
            "refund transaction id is empty".to_string(),
        ));
    }
    if !refund.total.is_positive() {
        return Err(LedgerError::InvalidRecord(format!(
            "refund total {} must be positive",
            refund.total
        )));
    }
    Ok(())
}

/// Validates a void before it is appended.
pub fn validate_void(void: &VoidRecord) -> Result<()> {
    if void.transaction_id.trim().is_empty() {
        return Err(LedgerError::InvalidRecord(
            "void transaction id is empty".to_string(),
        ));
    }
    if void.total.is_negative() {
        return Err(LedgerError::InvalidRecord(format!(
            "void total {} is negative",
            void.total
        )));
    }
    Ok(())
}
