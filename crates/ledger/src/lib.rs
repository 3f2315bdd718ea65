//! Append-only records kept alongside host orders.
//!
//! The reconciliation pipeline writes payments, refunds, voids and order
//! state history here. Refund, void and history records are insert-only;
//! payment records may be removed once the authorization they track has been
//! voided or captured.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::OrderId;
pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use record::{
    CardDetails, PaymentKind, PaymentRecord, RecordId, RefundRecord, StateHistoryEntry,
    VoidRecord,
};
pub use store::{Ledger, LedgerExt};
