//! vwsync Vaultwarden - Remote directory adapters
//!
//! Provides:
//! - An async client for the Vaultwarden admin API (`/admin/users`,
//!   `/admin/invite`, enable/disable)
//! - Admin session handling (`VW_ADMIN` cookie, re-login on 401)
//! - An in-memory directory implementing the same port, for tests and dry
//!   experiments
//!
//! ## Modules
//!
//! - [`session`] - Admin token and cached session cookie
//! - [`client`] - Vaultwarden admin API HTTP client
//! - [`provider`] - `IRemoteDirectory` implementation over the client
//! - [`memory`] - In-memory `IRemoteDirectory`

pub mod client;
pub mod memory;
pub mod provider;
pub mod session;

pub use client::VaultwardenClient;
pub use memory::InMemoryDirectory;
pub use provider::VaultwardenDirectory;
pub use session::AdminSession;

use thiserror::Error;

/// Errors that can occur when communicating with the Vaultwarden admin API
#[derive(Debug, Error)]
pub enum VaultwardenError {
    /// The admin token was rejected, or the session could not be renewed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server answered with a status other than the expected one
    #[error("Unexpected status from {path}: expected {expected}, got {actual}")]
    UnexpectedStatus {
        path: String,
        expected: u16,
        actual: u16,
    },

    /// A network-level error occurred (connection, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
