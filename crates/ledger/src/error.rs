use thiserror::Error;

use crate::RecordId;

/// Errors that can occur when reading or writing ledger records.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The record failed validation before it was written.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A record with the same id has already been written.
    #[error("Duplicate record: {0}")]
    DuplicateRecord(RecordId),

    /// A stored value could not be mapped back into a record.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
