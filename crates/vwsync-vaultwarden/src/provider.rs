//! VaultwardenDirectory - IRemoteDirectory implementation for the admin API
//!
//! Thin adapter over [`VaultwardenClient`] that adds operation context to
//! errors. `VaultwardenError` stays reachable through `downcast_ref`.

use anyhow::{Context, Result};
use tracing::debug;

use vwsync_core::domain::{AccountId, RemoteAccount};
use vwsync_core::ports::IRemoteDirectory;

use crate::client::VaultwardenClient;

/// Remote directory backed by a live Vaultwarden instance
pub struct VaultwardenDirectory {
    client: VaultwardenClient,
}

impl VaultwardenDirectory {
    /// Creates a new `VaultwardenDirectory` wrapping the given client
    pub fn new(client: VaultwardenClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &VaultwardenClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteDirectory for VaultwardenDirectory {
    async fn list_accounts(&self) -> Result<Vec<RemoteAccount>> {
        self.client
            .list_users()
            .await
            .context("Failed to list Vaultwarden users")
    }

    async fn invite(&self, email: &str) -> Result<AccountId> {
        debug!(email, "VaultwardenDirectory::invite");
        self.client
            .invite(email)
            .await
            .with_context(|| format!("Failed to invite {email}"))
    }

    /// Vaultwarden answers 200 for an already enabled user
    async fn enable(&self, id: &AccountId) -> Result<()> {
        debug!(account_id = %id, "VaultwardenDirectory::enable");
        self.client
            .enable(id)
            .await
            .with_context(|| format!("Failed to enable user {id}"))
    }

    async fn disable(&self, id: &AccountId) -> Result<()> {
        debug!(account_id = %id, "VaultwardenDirectory::disable");
        self.client
            .disable(id)
            .await
            .with_context(|| format!("Failed to disable user {id}"))
    }
}
