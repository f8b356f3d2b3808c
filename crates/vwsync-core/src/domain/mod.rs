//! Domain entities
//!
//! - Newtypes for remote account identifiers
//! - Account snapshots from the ledger and the remote directory
//! - Domain-specific error types

pub mod account;
pub mod errors;
pub mod newtypes;

pub use account::{LedgerState, ManagedAccount, RemoteAccount};
pub use errors::DomainError;
pub use newtypes::AccountId;
