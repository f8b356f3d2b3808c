//! Database connection pool management
//!
//! Wraps SQLx's SqlitePool with directory creation, WAL mode, and the
//! embedded schema migration.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::LedgerStoreError;

/// Manages a pool of SQLite connections for the ledger
///
/// The pool is configured with:
/// - WAL journal mode
/// - 2 max connections for file-based databases (there is a single writer)
/// - 1 connection for in-memory databases (required for data persistence)
/// - 5-second busy timeout
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Creates a new database pool connected to the specified file
    ///
    /// Parent directories and the database file are created if missing,
    /// then the schema migration runs.
    ///
    /// # Errors
    ///
    /// Returns `LedgerStoreError::ConnectionFailed` if the connection cannot be
    /// established, or `LedgerStoreError::MigrationFailed` if the migration fails.
    pub async fn new(db_path: &Path) -> Result<Self, LedgerStoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LedgerStoreError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| {
                LedgerStoreError::ConnectionFailed(format!(
                    "Failed to open ledger at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::info!(path = %db_path.display(), "Ledger database opened");

        Ok(Self { pool })
    }

    /// Creates an in-memory database pool for testing
    ///
    /// # Errors
    ///
    /// Returns `LedgerStoreError::ConnectionFailed` if the connection cannot be
    /// established, or `LedgerStoreError::MigrationFailed` if the migration fails.
    pub async fn in_memory() -> Result<Self, LedgerStoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                LedgerStoreError::ConnectionFailed(format!(
                    "Failed to create in-memory database: {}",
                    e
                ))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::debug!("In-memory ledger initialized");

        Ok(Self { pool })
    }

    /// Returns a reference to the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), LedgerStoreError> {
        let migration_sql = include_str!("migrations/0001_managed_accounts.sql");
        sqlx::raw_sql(migration_sql)
            .execute(pool)
            .await
            .map_err(|e| {
                LedgerStoreError::MigrationFailed(format!("Failed to create ledger schema: {}", e))
            })?;

        tracing::debug!("Ledger migrations completed");
        Ok(())
    }
}
