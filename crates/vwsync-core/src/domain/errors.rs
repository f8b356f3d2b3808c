//! Domain error types

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote account identifier
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(String),

    /// A ledger state string that is not one of ENABLED, DISABLED or DELETED
    #[error("Invalid ledger state '{0}': must be one of ENABLED, DISABLED, DELETED")]
    InvalidState(String),
}
