//! Remote directory port (driven/secondary port)
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport and authentication failures are
//!   adapter-specific. The driver aborts the pass on any of them.
//! - `enable` and `disable` must be idempotent: repeating them on an account
//!   that is already in the requested state is not an error.

use crate::domain::{AccountId, RemoteAccount};

/// Port trait for the identity provider's account roster
#[async_trait::async_trait]
pub trait IRemoteDirectory: Send + Sync {
    /// Lists every account known to the remote directory
    ///
    /// Account ids in the returned list are unique.
    async fn list_accounts(&self) -> anyhow::Result<Vec<RemoteAccount>>;

    /// Invites a new account and returns the id the directory assigned to it
    async fn invite(&self, email: &str) -> anyhow::Result<AccountId>;

    /// Enables an account
    async fn enable(&self, id: &AccountId) -> anyhow::Result<()>;

    /// Disables an account
    async fn disable(&self, id: &AccountId) -> anyhow::Result<()>;
}
