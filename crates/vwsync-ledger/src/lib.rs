//! vwsync Ledger - Durable record of managed accounts
//!
//! SQLite-based storage for the accounts vwsync invited or adopted, together
//! with their last known remote email and state.
//!
//! ## Architecture
//!
//! This crate implements the `ILedger` port from `vwsync-core` using SQLite
//! as the storage backend. It is a driven (secondary) adapter in the
//! hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteLedger`] - `ILedger` implementation
//! - [`LedgerStoreError`] - Error types for storage operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use vwsync_ledger::{DatabasePool, SqliteLedger};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/var/lib/vwsync/ledger.db")).await?;
//! let ledger = SqliteLedger::new(pool.pool().clone());
//! // Use ledger as ILedger...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::SqliteLedger;

/// Errors that can occur during ledger storage operations
///
/// Integrity failures the driver reacts to (duplicates, invalid states) are
/// reported as `vwsync_core::ports::LedgerError` instead.
#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be turned back into a domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for LedgerStoreError {
    fn from(e: sqlx::Error) -> Self {
        LedgerStoreError::QueryFailed(e.to_string())
    }
}
