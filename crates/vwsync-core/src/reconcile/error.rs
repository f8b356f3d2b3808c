//! Error types for the reconciliation engine

use thiserror::Error;

use crate::domain::AccountId;

/// Invariant violations found while reconciling
///
/// Any of these means a snapshot is corrupt. The pass must fail rather than
/// act on a plan derived from it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Two ledger records share an invite email
    #[error("ledger tracks invite email {email} for both {first} and {second}")]
    DuplicateInviteEmail {
        email: String,
        first: AccountId,
        second: AccountId,
    },

    /// A snapshot lists the same account id twice
    #[error("{snapshot} snapshot lists account {id} more than once")]
    DuplicateAccountId { snapshot: &'static str, id: AccountId },

    /// Planning needed an email that is missing from the invite email index
    #[error("invite email {0} is not indexed")]
    UnindexedEmail(String),
}
