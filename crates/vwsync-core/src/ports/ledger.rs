//! Ledger port (driven/secondary port)
//!
//! The ledger records which remote accounts this system created or adopted,
//! and what it last observed about them. It is the baseline the change
//! planner compares against, so that operator overrides made directly at the
//! remote directory are reported instead of reverted.
//!
//! ## Design Notes
//!
//! - Each call commits on its own. There is no transaction spanning the ledger
//!   and the remote directory; the next pass corrects any divergence.
//! - Integrity failures are reported as [`LedgerError`] wrapped in the
//!   `anyhow::Error`, so callers can recognise them with `downcast_ref`.

use thiserror::Error;

use crate::domain::{AccountId, LedgerState, ManagedAccount};

/// Classified ledger failures callers may want to react to
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A record with the same invite email or account id already exists
    #[error("Ledger already tracks {email} / {id}")]
    Duplicate { email: String, id: String },

    /// A stored state string is not one of ENABLED, DISABLED, DELETED
    #[error("Ledger row for {id} has invalid state '{state}'")]
    InvalidState { id: String, state: String },
}

/// Port trait for the durable account ledger
#[async_trait::async_trait]
pub trait ILedger: Send + Sync {
    /// Returns every managed account
    async fn list_managed_accounts(&self) -> anyhow::Result<Vec<ManagedAccount>>;

    /// Registers a newly invited or adopted account
    ///
    /// The tracked email starts out equal to `invite_email`.
    ///
    /// # Errors
    /// Fails with [`LedgerError::Duplicate`] if the email or id is already tracked
    async fn register(
        &self,
        invite_email: &str,
        id: &AccountId,
        state: LedgerState,
    ) -> anyhow::Result<()>;

    /// Sets the state of an account
    async fn set_state(&self, id: &AccountId, state: LedgerState) -> anyhow::Result<()>;

    /// Records the account's current remote email
    async fn update_tracked_email(&self, id: &AccountId, email: &str) -> anyhow::Result<()>;

    /// Stops tracking an account by id
    async fn delete_by_id(&self, id: &AccountId) -> anyhow::Result<()>;

    /// Stops tracking the account whose tracked email equals `email`
    async fn delete_by_email(&self, email: &str) -> anyhow::Result<()>;

    /// Removes every record
    async fn truncate(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_recoverable_through_anyhow() {
        let err: anyhow::Error = LedgerError::Duplicate {
            email: "a@test.com".into(),
            id: "u1".into(),
        }
        .into();
        let err = err.context("registering a@test.com");
        assert!(matches!(
            err.downcast_ref::<LedgerError>(),
            Some(LedgerError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = LedgerError::InvalidState {
            id: "u1".into(),
            state: "GONE".into(),
        };
        assert_eq!(err.to_string(), "Ledger row for u1 has invalid state 'GONE'");
    }
}
