//! Port definitions (hexagonal architecture interfaces)
//!
//! The driver depends on these traits; their implementations live in
//! adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IEmailSource`] - Authoritative list of expected member emails (LDAP, fixtures)
//! - [`IRemoteDirectory`] - Account roster of the identity provider (Vaultwarden)
//! - [`ILedger`] - Durable record of accounts this system manages

pub mod email_source;
pub mod ledger;
pub mod remote_directory;

pub use email_source::IEmailSource;
pub use ledger::{ILedger, LedgerError};
pub use remote_directory::IRemoteDirectory;
