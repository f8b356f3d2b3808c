//! Reconciliation output types

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::domain::{AccountId, ManagedAccount, RemoteAccount};

/// A managed account whose email changed at the remote directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailChange {
    pub id: AccountId,
    /// Tracked email in the ledger
    pub old_email: String,
    /// Current email at the remote directory
    pub new_email: String,
}

/// Differences between the three views that the ledger has not caught up with
///
/// These are findings only. The driver decides which of them to write back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Drift {
    /// Managed accounts missing from the remote directory
    pub vanished_in_remote: BTreeSet<AccountId>,
    /// Managed as enabled, disabled at the remote directory
    pub disabled_in_remote: BTreeSet<AccountId>,
    /// Managed as disabled (or deleted), enabled at the remote directory
    pub enabled_in_remote: BTreeSet<AccountId>,
    /// Ordered by account id
    pub email_changes: Vec<EmailChange>,
    /// Tracked emails present neither at the remote directory nor in the source
    pub vanished_in_both: BTreeSet<String>,
    /// Unmanaged remote accounts whose email is listed by the source, ordered by email
    pub adoption_candidates: Vec<RemoteAccount>,
}

/// Mutations that bring the remote directory in line with the source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub to_invite: BTreeSet<String>,
    pub to_disable: BTreeSet<AccountId>,
    pub to_enable: BTreeSet<AccountId>,
}

impl ChangeSet {
    /// Total number of planned mutations
    pub fn total(&self) -> usize {
        self.to_invite.len() + self.to_disable.len() + self.to_enable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Everything one reconciliation found and planned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub drift: Drift,
    pub plan: ChangeSet,
    managed_by_id: BTreeMap<AccountId, ManagedAccount>,
    remote_by_id: BTreeMap<AccountId, RemoteAccount>,
}

impl SyncResult {
    pub(crate) fn new(
        drift: Drift,
        plan: ChangeSet,
        managed_by_id: BTreeMap<AccountId, ManagedAccount>,
        remote_by_id: BTreeMap<AccountId, RemoteAccount>,
    ) -> Self {
        Self {
            drift,
            plan,
            managed_by_id,
            remote_by_id,
        }
    }

    /// Ledger record for `id`, as it was when the pass started
    pub fn managed(&self, id: &AccountId) -> Option<&ManagedAccount> {
        self.managed_by_id.get(id)
    }

    /// Remote record for `id`, as it was when the pass started
    pub fn remote(&self, id: &AccountId) -> Option<&RemoteAccount> {
        self.remote_by_id.get(id)
    }

    /// Best email to show for `id` in log output
    pub fn display_email(&self, id: &AccountId) -> String {
        self.remote(id)
            .map(|r| r.email.clone())
            .or_else(|| self.managed(id).map(|m| m.tracked_email.clone()))
            .unwrap_or_else(|| id.to_string())
    }

    /// Counts per category
    pub fn summary(&self) -> Summary {
        Summary {
            vanished_in_remote: self.drift.vanished_in_remote.len(),
            disabled_in_remote: self.drift.disabled_in_remote.len(),
            enabled_in_remote: self.drift.enabled_in_remote.len(),
            email_changes: self.drift.email_changes.len(),
            vanished_in_both: self.drift.vanished_in_both.len(),
            adoption_candidates: self.drift.adoption_candidates.len(),
            to_invite: self.plan.to_invite.len(),
            to_disable: self.plan.to_disable.len(),
            to_enable: self.plan.to_enable.len(),
        }
    }
}

/// Per-category counts of a [`SyncResult`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub vanished_in_remote: usize,
    pub disabled_in_remote: usize,
    pub enabled_in_remote: usize,
    pub email_changes: usize,
    pub vanished_in_both: usize,
    pub adoption_candidates: usize,
    pub to_invite: usize,
    pub to_disable: usize,
    pub to_enable: usize,
}

impl Summary {
    pub fn planned(&self) -> usize {
        self.to_invite + self.to_disable + self.to_enable
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "drift: vanished_in_remote={} disabled_in_remote={} enabled_in_remote={} \
             email_changes={} vanished_in_both={} adoption_candidates={}; \
             plan: invite={} disable={} enable={}",
            self.vanished_in_remote,
            self.disabled_in_remote,
            self.enabled_in_remote,
            self.email_changes,
            self.vanished_in_both,
            self.adoption_candidates,
            self.to_invite,
            self.to_disable,
            self.to_enable,
        )
    }
}
