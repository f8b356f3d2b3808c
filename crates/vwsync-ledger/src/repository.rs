//! SQLite implementation of ILedger
//!
//! ## Type Mapping
//!
//! | Domain Type   | Column          | Strategy                                  |
//! |---------------|-----------------|-------------------------------------------|
//! | AccountId     | `account_id`    | `.as_str()` / `AccountId::new()`          |
//! | LedgerState   | `state`         | `.as_str()` / `FromStr`, CHECK constraint |
//! | DateTime<Utc> | `last_touched`  | RFC 3339 via `to_rfc3339()`               |

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use vwsync_core::domain::{AccountId, LedgerState, ManagedAccount};
use vwsync_core::ports::{ILedger, LedgerError};

use crate::LedgerStoreError;

/// SQLite-based implementation of the ledger port
///
/// Every method runs a single statement, so each call commits on its own.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Creates a new ledger over the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Reconstruct a ManagedAccount from a database row
///
/// An unknown state string is reported as [`LedgerError::InvalidState`];
/// it is never mapped to a default.
fn managed_account_from_row(row: &SqliteRow) -> anyhow::Result<ManagedAccount> {
    let id_str: String = row.try_get("account_id")?;
    let invite_email: String = row.try_get("invite_email")?;
    let tracked_email: String = row.try_get("tracked_email")?;
    let state_str: String = row.try_get("state")?;

    let id = AccountId::new(id_str.clone()).map_err(|e| {
        LedgerStoreError::SerializationError(format!("Invalid AccountId '{}': {}", id_str, e))
    })?;

    let state: LedgerState = state_str
        .parse()
        .map_err(|_| LedgerError::InvalidState {
            id: id_str,
            state: state_str,
        })?;

    Ok(ManagedAccount {
        id,
        tracked_email,
        invite_email,
        state,
    })
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

// ============================================================================
// ILedger implementation
// ============================================================================

#[async_trait::async_trait]
impl ILedger for SqliteLedger {
    async fn list_managed_accounts(&self) -> anyhow::Result<Vec<ManagedAccount>> {
        let rows = sqlx::query(
            "SELECT account_id, invite_email, tracked_email, state \
             FROM managed_accounts ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(managed_account_from_row).collect()
    }

    async fn register(
        &self,
        invite_email: &str,
        id: &AccountId,
        state: LedgerState,
    ) -> anyhow::Result<()> {
        let result = sqlx::query(
            "INSERT INTO managed_accounts \
             (account_id, invite_email, tracked_email, state, last_touched) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(invite_email)
        .bind(invite_email)
        .bind(state.as_str())
        .bind(now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::trace!(account_id = %id, email = %invite_email, %state, "Registered account");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(LedgerError::Duplicate {
                    email: invite_email.to_string(),
                    id: id.to_string(),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_state(&self, id: &AccountId, state: LedgerState) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE managed_accounts SET state = ?, last_touched = ? WHERE account_id = ?",
        )
        .bind(state.as_str())
        .bind(now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(account_id = %id, %state, "set_state matched no ledger row");
        }
        Ok(())
    }

    async fn update_tracked_email(&self, id: &AccountId, email: &str) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE managed_accounts SET tracked_email = ?, last_touched = ? WHERE account_id = ?",
        )
        .bind(email)
        .bind(now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(account_id = %id, "update_tracked_email matched no ledger row");
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &AccountId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM managed_accounts WHERE account_id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM managed_accounts WHERE tracked_email = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;

        tracing::trace!(email = %email, deleted = result.rows_affected(), "Deleted by tracked email");
        Ok(())
    }

    async fn truncate(&self) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM managed_accounts")
            .execute(&self.pool)
            .await?;

        tracing::info!(deleted = result.rows_affected(), "Ledger truncated");
        Ok(())
    }
}
