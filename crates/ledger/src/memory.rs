use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    LedgerError, OrderId, PaymentRecord, RecordId, RefundRecord, Result, StateHistoryEntry,
    VoidRecord,
    store::{Ledger, validate_payment, validate_refund, validate_void},
};

#[derive(Default)]
struct Records {
    payments: Vec<PaymentRecord>,
    refunds: Vec<RefundRecord>,
    voids: Vec<VoidRecord>,
    history: Vec<StateHistoryEntry>,
}

/// In-memory ledger implementation for testing and single-process use.
///
/// This implementation keeps all records in memory and provides the same
/// interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    records: Arc<RwLock<Records>>,
}

impl InMemoryLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of refund records.
    pub async fn refund_count(&self) -> usize {
        self.records.read().await.refunds.len()
    }

    /// Returns the total number of void records.
    pub async fn void_count(&self) -> usize {
        self.records.read().await.voids.len()
    }

    /// Returns the total number of payment records.
    pub async fn payment_count(&self) -> usize {
        self.records.read().await.payments.len()
    }

    /// Returns the total number of history entries.
    pub async fn history_count(&self) -> usize {
        self.records.read().await.history.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        *records = Records::default();
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn record_payment(&self, payment: PaymentRecord) -> Result<()> {
        validate_payment(&payment)?;
        let mut records = self.records.write().await;
        if records.payments.iter().any(|p| p.id == payment.id) {
            return Err(LedgerError::DuplicateRecord(payment.id));
        }
        records.payments.push(payment);
        metrics::counter!("ledger_records_written_total", "kind" => "payment").increment(1);
        Ok(())
    }

    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .payments
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_payment(
        &self,
        order_id: OrderId,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .payments
            .iter()
            .find(|p| p.order_id == order_id && p.transaction_id == transaction_id)
            .cloned())
    }

    async fn delete_payment(&self, id: RecordId) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.payments.len();
        records.payments.retain(|p| p.id != id);
        Ok(records.payments.len() != before)
    }

    async fn append_refund(&self, refund: RefundRecord) -> Result<()> {
        validate_refund(&refund)?;
        let mut records = self.records.write().await;
        if records.refunds.iter().any(|r| r.id == refund.id) {
            return Err(LedgerError::DuplicateRecord(refund.id));
        }
        records.refunds.push(refund);
        metrics::counter!("ledger_records_written_total", "kind" => "refund").increment(1);
        Ok(())
    }

    async fn refunds_for_order(&self, order_id: OrderId) -> Result<Vec<RefundRecord>> {
        let records = self.records.read().await;
        Ok(records
            .refunds
            .iter()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn append_void(&self, void: VoidRecord) -> Result<()> {
        validate_void(&void)?;
        let mut records = self.records.write().await;
        if records.voids.iter().any(|v| v.id == void.id) {
            return Err(LedgerError::DuplicateRecord(void.id));
        }
        records.voids.push(void);
        metrics::counter!("ledger_records_written_total", "kind" => "void").increment(1);
        Ok(())
    }

    async fn voids_for_order(&self, order_id: OrderId) -> Result<Vec<VoidRecord>> {
        let records = self.records.read().await;
        Ok(records
            .voids
            .iter()
            .filter(|v| v.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn append_history(&self, entry: StateHistoryEntry) -> Result<()> {
        let mut records = self.records.write().await;
        records.history.push(entry);
        Ok(())
    }

    async fn history_for_order(&self, order_id: OrderId) -> Result<Vec<StateHistoryEntry>> {
        let records = self.records.read().await;
        Ok(records
            .history
            .iter()
            .filter(|h| h.order_id == order_id)
            .cloned()
            .collect())
    }
}
