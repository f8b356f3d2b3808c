//! Lookup structures derived from the managed and remote snapshots

use std::collections::{BTreeMap, BTreeSet};

use super::error::ReconcileError;
use crate::domain::{AccountId, ManagedAccount, RemoteAccount};

/// Indexes over the ledger snapshot
///
/// Accounts in state `DISABLED` or `DELETED` both land in the disabled
/// partition; only `ENABLED` counts as enabled.
#[derive(Debug, Default)]
pub(crate) struct ManagedIndex {
    pub by_id: BTreeMap<AccountId, ManagedAccount>,
    pub enabled_ids: BTreeSet<AccountId>,
    pub disabled_ids: BTreeSet<AccountId>,
    pub id_by_invite_email: BTreeMap<String, AccountId>,
    pub invite_emails: BTreeSet<String>,
    pub tracked_emails: BTreeSet<String>,
    pub enabled_invite_emails: BTreeSet<String>,
    pub disabled_invite_emails: BTreeSet<String>,
}

impl ManagedIndex {
    /// Builds the index, rejecting duplicate ids and duplicate invite emails
    pub fn build(accounts: &[ManagedAccount]) -> Result<Self, ReconcileError> {
        let mut index = Self::default();

        for account in accounts {
            if index.by_id.contains_key(&account.id) {
                return Err(ReconcileError::DuplicateAccountId {
                    snapshot: "ledger",
                    id: account.id.clone(),
                });
            }
            if let Some(first) = index.id_by_invite_email.get(&account.invite_email) {
                return Err(ReconcileError::DuplicateInviteEmail {
                    email: account.invite_email.clone(),
                    first: first.clone(),
                    second: account.id.clone(),
                });
            }

            index
                .id_by_invite_email
                .insert(account.invite_email.clone(), account.id.clone());
            index.invite_emails.insert(account.invite_email.clone());
            index.tracked_emails.insert(account.tracked_email.clone());

            if account.enabled() {
                index.enabled_ids.insert(account.id.clone());
                index
                    .enabled_invite_emails
                    .insert(account.invite_email.clone());
            } else {
                index.disabled_ids.insert(account.id.clone());
                index
                    .disabled_invite_emails
                    .insert(account.invite_email.clone());
            }

            index.by_id.insert(account.id.clone(), account.clone());
        }

        Ok(index)
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &AccountId> {
        self.by_id.keys()
    }
}

/// Indexes over the remote directory snapshot
#[derive(Debug, Default)]
pub(crate) struct RemoteIndex {
    pub by_id: BTreeMap<AccountId, RemoteAccount>,
    pub enabled_ids: BTreeSet<AccountId>,
    pub disabled_ids: BTreeSet<AccountId>,
    /// First account listed wins if two share an email
    pub id_by_email: BTreeMap<String, AccountId>,
    pub emails: BTreeSet<String>,
    pub disabled_emails: BTreeSet<String>,
}

impl RemoteIndex {
    /// Builds the index, rejecting duplicate ids
    pub fn build(accounts: &[RemoteAccount]) -> Result<Self, ReconcileError> {
        let mut index = Self::default();

        for account in accounts {
            if index.by_id.contains_key(&account.id) {
                return Err(ReconcileError::DuplicateAccountId {
                    snapshot: "remote",
                    id: account.id.clone(),
                });
            }

            index
                .id_by_email
                .entry(account.email.clone())
                .or_insert_with(|| account.id.clone());
            index.emails.insert(account.email.clone());

            if account.enabled {
                index.enabled_ids.insert(account.id.clone());
            } else {
                index.disabled_ids.insert(account.id.clone());
                index.disabled_emails.insert(account.email.clone());
            }

            index.by_id.insert(account.id.clone(), account.clone());
        }

        Ok(index)
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.by_id.contains_key(id)
    }
}
