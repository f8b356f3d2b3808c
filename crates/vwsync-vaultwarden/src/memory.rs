//! In-memory remote directory
//!
//! Behaves like the admin API as far as the reconciliation driver can tell:
//! ids are assigned on invite, enable/disable are idempotent, and unknown ids
//! are ignored. The `delete_account`, `set_email`, and `set_enabled` helpers
//! simulate changes an operator makes by hand.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use vwsync_core::domain::{AccountId, RemoteAccount};
use vwsync_core::ports::IRemoteDirectory;

/// Process-local stand-in for a Vaultwarden instance
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: Mutex<BTreeMap<AccountId, RemoteAccount>>,
    mutations: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory pre-populated with `accounts`
    pub fn with_accounts(accounts: impl IntoIterator<Item = RemoteAccount>) -> Self {
        let accounts = accounts.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self {
            accounts: Mutex::new(accounts),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Looks up an account by id
    pub async fn get(&self, id: &AccountId) -> Option<RemoteAccount> {
        self.accounts.lock().await.get(id).cloned()
    }

    /// Looks up an account by email
    pub async fn find_by_email(&self, email: &str) -> Option<RemoteAccount> {
        self.accounts
            .lock()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned()
    }

    /// Number of invite/enable/disable calls received
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Removes an account as an operator would
    pub async fn delete_account(&self, id: &AccountId) -> bool {
        self.accounts.lock().await.remove(id).is_some()
    }

    /// Changes an account's email as its owner would
    pub async fn set_email(&self, id: &AccountId, email: impl Into<String>) -> bool {
        match self.accounts.lock().await.get_mut(id) {
            Some(account) => {
                account.email = email.into();
                true
            }
            None => false,
        }
    }

    /// Enables or disables an account without counting as a driver mutation
    pub async fn set_enabled(&self, id: &AccountId, enabled: bool) -> bool {
        match self.accounts.lock().await.get_mut(id) {
            Some(account) => {
                account.enabled = enabled;
                true
            }
            None => false,
        }
    }

    async fn set_flag(&self, id: &AccountId, enabled: bool) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        if let Some(account) = self.accounts.lock().await.get_mut(id) {
            account.enabled = enabled;
        } else {
            debug!(account_id = %id, enabled, "Ignoring state change for unknown account");
        }
    }
}

#[async_trait::async_trait]
impl IRemoteDirectory for InMemoryDirectory {
    async fn list_accounts(&self) -> Result<Vec<RemoteAccount>> {
        Ok(self.accounts.lock().await.values().cloned().collect())
    }

    async fn invite(&self, email: &str) -> Result<AccountId> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().await;
        if let Some(existing) = accounts.values().find(|a| a.email == email) {
            anyhow::bail!("User {email} already exists as {}", existing.id);
        }

        let id = AccountId::new(Uuid::new_v4().to_string())?;
        accounts.insert(id.clone(), RemoteAccount::new(id.clone(), email, true));
        Ok(id)
    }

    async fn enable(&self, id: &AccountId) -> Result<()> {
        self.set_flag(id, true).await;
        Ok(())
    }

    async fn disable(&self, id: &AccountId) -> Result<()> {
        self.set_flag(id, false).await;
        Ok(())
    }
}
