use async_trait::async_trait;
use common::{Currency, Money, StateId};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CardDetails, LedgerError, OrderId, PaymentKind, PaymentRecord, RecordId, RefundRecord,
    Result, StateHistoryEntry, VoidRecord,
    store::{Ledger, validate_payment, validate_refund, validate_void},
};

/// PostgreSQL-backed ledger implementation.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_payment(row: PgRow) -> Result<PaymentRecord> {
        let kind: String = row.try_get("kind")?;
        let currency: String = row.try_get("currency")?;

        Ok(PaymentRecord {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            order_reference: row.try_get("order_reference")?,
            transaction_id: row.try_get("transaction_id")?,
            kind: PaymentKind::parse(&kind)
                .ok_or_else(|| LedgerError::CorruptRecord(format!("unknown payment kind {kind}")))?,
            amount: Money::new(row.try_get::<Decimal, _>("amount")?),
            currency: Currency::parse(&currency)
                .map_err(|e| LedgerError::CorruptRecord(e.to_string()))?,
            payment_method: row.try_get("payment_method")?,
            card: CardDetails {
                number: row.try_get("card_number")?,
                expiration: row.try_get("card_expiration")?,
                brand: row.try_get("card_brand")?,
                holder: row.try_get("card_holder")?,
            },
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_refund(row: PgRow) -> Result<RefundRecord> {
        Ok(RefundRecord {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            transaction_id: row.try_get("transaction_id")?,
            total: Money::new(row.try_get::<Decimal, _>("total")?),
            credit_note_id: row.try_get("credit_note_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_void(row: PgRow) -> Result<VoidRecord> {
        Ok(VoidRecord {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            transaction_id: row.try_get("transaction_id")?,
            total: Money::new(row.try_get::<Decimal, _>("total")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_history(row: PgRow) -> Result<StateHistoryEntry> {
        Ok(StateHistoryEntry {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            from_state: StateId::new(row.try_get("from_state")?),
            to_state: StateId::new(row.try_get("to_state")?),
            customer_notified: row.try_get("customer_notified")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_insert_error(id: RecordId, e: sqlx::Error) -> LedgerError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return LedgerError::DuplicateRecord(id);
        }
        LedgerError::Database(e)
    }
}

#[async_trait]
impl Ledger for PostgresLedger {
    #[tracing::instrument(skip(self, payment), fields(order_id = %payment.order_id))]
    async fn record_payment(&self, payment: PaymentRecord) -> Result<()> {
        validate_payment(&payment)?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, order_reference, transaction_id, kind, amount, currency,
                payment_method, card_number, card_expiration, card_brand, card_holder, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_i64())
        .bind(&payment.order_reference)
        .bind(&payment.transaction_id)
        .bind(payment.kind.as_str())
        .bind(payment.amount.amount())
        .bind(payment.currency.code())
        .bind(&payment.payment_method)
        .bind(&payment.card.number)
        .bind(&payment.card.expiration)
        .bind(&payment.card.brand)
        .bind(&payment.card.holder)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(payment.id, e))?;

        metrics::counter!("ledger_records_written_total", "kind" => "payment").increment(1);
        Ok(())
    }

    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, order_reference, transaction_id, kind, amount, currency,
                   payment_method, card_number, card_expiration, card_brand, card_holder, created_at
            FROM payments
            WHERE order_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn find_payment(
        &self,
        order_id: OrderId,
        transaction_id: &str,
    ) -> Result<Option<PaymentRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, order_id, order_reference, transaction_id, kind, amount, currency,
                   payment_method, card_number, card_expiration, card_brand, card_holder, created_at
            FROM payments
            WHERE order_id = $1 AND transaction_id = $2
            ORDER BY seq ASC
            LIMIT 1
            "#,
        )
        .bind(order_id.as_i64())
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn delete_payment(&self, id: RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, refund), fields(order_id = %refund.order_id))]
    async fn append_refund(&self, refund: RefundRecord) -> Result<()> {
        validate_refund(&refund)?;

        sqlx::query(
            r#"
            INSERT INTO refunds (id, order_id, transaction_id, total, credit_note_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(refund.id.as_uuid())
        .bind(refund.order_id.as_i64())
        .bind(&refund.transaction_id)
        .bind(refund.total.amount())
        .bind(refund.credit_note_id)
        .bind(refund.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(refund.id, e))?;

        metrics::counter!("ledger_records_written_total", "kind" => "refund").increment(1);
        Ok(())
    }

    async fn refunds_for_order(&self, order_id: OrderId) -> Result<Vec<RefundRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, transaction_id, total, credit_note_id, created_at
            FROM refunds
            WHERE order_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_refund).collect()
    }

    #[tracing::instrument(skip(self, void), fields(order_id = %void.order_id))]
    async fn append_void(&self, void: VoidRecord) -> Result<()> {
        validate_void(&void)?;

        sqlx::query(
            r#"
            INSERT INTO voids (id, order_id, transaction_id, total, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(void.id.as_uuid())
        .bind(void.order_id.as_i64())
        .bind(&void.transaction_id)
        .bind(void.total.amount())
        .bind(void.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(void.id, e))?;

        metrics::counter!("ledger_records_written_total", "kind" => "void").increment(1);
        Ok(())
    }

    async fn voids_for_order(&self, order_id: OrderId) -> Result<Vec<VoidRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, transaction_id, total, created_at
            FROM voids
            WHERE order_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_void).collect()
    }

    async fn append_history(&self, entry: StateHistoryEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_state_history (id, order_id, from_state, to_state, customer_notified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.order_id.as_i64())
        .bind(entry.from_state.as_i64())
        .bind(entry.to_state.as_i64())
        .bind(entry.customer_notified)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(entry.id, e))?;

        Ok(())
    }

    async fn history_for_order(&self, order_id: OrderId) -> Result<Vec<StateHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, from_state, to_state, customer_notified, created_at
            FROM order_state_history
            WHERE order_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_history).collect()
    }
}
