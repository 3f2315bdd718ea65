use chrono::{DateTime, Utc};
use common::{Currency, Money, OrderId, StateId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a payment record stands for at the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentKind {
    /// A hold on funds that can still be captured or voided.
    Authorization,

    /// Funds that have been taken.
    Capture,
}

impl PaymentKind {
    /// Returns the stored name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Authorization => "AUTHORIZATION",
            PaymentKind::Capture => "CAPTURE",
        }
    }

    /// Parses a stored kind name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AUTHORIZATION" => Some(PaymentKind::Authorization),
            "CAPTURE" => Some(PaymentKind::Capture),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrument details shown to the merchant next to a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    /// Masked card number.
    pub number: Option<String>,
    /// Expiry as `MM/YY`.
    pub expiration: Option<String>,
    /// Card scheme or alternative payment method label.
    pub brand: Option<String>,
    /// Name of the card or account holder.
    pub holder: Option<String>,
}

/// A payment the gateway has confirmed for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: RecordId,
    pub order_id: OrderId,
    /// Gateway order reference the payment was made under.
    pub order_reference: String,
    /// Gateway transaction that produced the payment.
    pub transaction_id: String,
    pub kind: PaymentKind,
    pub amount: Money,
    pub currency: Currency,
    /// Payment module code of the host order.
    pub payment_method: String,
    pub card: CardDetails,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Creates a payment record with empty card details.
    pub fn new(
        order_id: OrderId,
        order_reference: impl Into<String>,
        transaction_id: impl Into<String>,
        kind: PaymentKind,
        amount: Money,
        currency: Currency,
    ) -> Self {
        Self {
            id: RecordId::new(),
            order_id,
            order_reference: order_reference.into(),
            transaction_id: transaction_id.into(),
            kind,
            amount,
            currency,
            payment_method: String::new(),
            card: CardDetails::default(),
            created_at: Utc::now(),
        }
    }

    /// Sets the payment method label.
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = method.into();
        self
    }

    /// Sets the instrument details.
    pub fn with_card(mut self, card: CardDetails) -> Self {
        self.card = card;
        self
    }
}

/// A refund confirmed by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundRecord {
    pub id: RecordId,
    pub order_id: OrderId,
    pub transaction_id: String,
    pub total: Money,
    /// Credit note that triggered the refund, if any.
    pub credit_note_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl RefundRecord {
    /// Creates a refund record not linked to a credit note.
    pub fn new(order_id: OrderId, transaction_id: impl Into<String>, total: Money) -> Self {
        Self {
            id: RecordId::new(),
            order_id,
            transaction_id: transaction_id.into(),
            total,
            credit_note_id: None,
            created_at: Utc::now(),
        }
    }

    /// Links the refund to the credit note that triggered it.
    pub fn with_credit_note(mut self, credit_note_id: i64) -> Self {
        self.credit_note_id = Some(credit_note_id);
        self
    }

    /// A refund issued without a credit note covers the whole order.
    pub fn is_full_refund(&self) -> bool {
        self.credit_note_id.is_none()
    }
}

/// A voided authorization confirmed by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidRecord {
    pub id: RecordId,
    pub order_id: OrderId,
    pub transaction_id: String,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

impl VoidRecord {
    /// Creates a void record.
    pub fn new(order_id: OrderId, transaction_id: impl Into<String>, total: Money) -> Self {
        Self {
            id: RecordId::new(),
            order_id,
            transaction_id: transaction_id.into(),
            total,
            created_at: Utc::now(),
        }
    }
}

/// One order state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub id: RecordId,
    pub order_id: OrderId,
    pub from_state: StateId,
    pub to_state: StateId,
    /// Whether the customer was sent a notification for the change.
    pub customer_notified: bool,
    pub created_at: DateTime<Utc>,
}

impl StateHistoryEntry {
    /// Creates a history entry stamped with the current time.
    pub fn new(
        order_id: OrderId,
        from_state: StateId,
        to_state: StateId,
        customer_notified: bool,
    ) -> Self {
        Self {
            id: RecordId::new(),
            order_id,
            from_state,
            to_state,
            customer_notified,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_kind_names_round_trip() {
        for kind in [PaymentKind::Authorization, PaymentKind::Capture] {
            assert_eq!(PaymentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PaymentKind::parse("REFUND"), None);
    }

    #[test]
    fn refund_without_credit_note_is_full() {
        let refund = RefundRecord::new(OrderId::new(1), "T1", Money::from_cents(1000));
        assert!(refund.is_full_refund());
        assert!(!refund.with_credit_note(9).is_full_refund());
    }

    #[test]
    fn payment_builder_sets_details() {
        let card = CardDetails {
            number: Some("512345xxxxxx0008".to_string()),
            expiration: Some("05/39".to_string()),
            brand: Some("MASTERCARD".to_string()),
            holder: Some("Jane Doe".to_string()),
        };
        let payment = PaymentRecord::new(
            OrderId::new(1),
            "mpgs-10",
            "T1",
            PaymentKind::Authorization,
            Money::from_cents(2500),
            Currency::parse("USD").unwrap(),
        )
        .with_payment_method("MPGS")
        .with_card(card.clone());

        assert_eq!(payment.payment_method, "MPGS");
        assert_eq!(payment.card, card);
    }
}
