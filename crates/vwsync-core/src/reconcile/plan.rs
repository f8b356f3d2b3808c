//! Change planning
//!
//! The plan is computed against the ledger as it was at the start of the
//! pass. Drift findings do not feed into it.
//!
//! A managed account counts as listed when the source carries its invite
//! email or its current remote email. Disables and enables both use that
//! rule, so an address renamed in the source and at the remote stays put.

use std::collections::BTreeSet;

use super::error::ReconcileError;
use super::index::{ManagedIndex, RemoteIndex};
use super::result::ChangeSet;
use crate::domain::AccountId;

pub(crate) fn plan(
    source: &BTreeSet<String>,
    managed: &ManagedIndex,
    remote: &RemoteIndex,
) -> Result<ChangeSet, ReconcileError> {
    // Anything already known under any email is never invited again
    let to_invite = source
        .iter()
        .filter(|email| {
            !remote.emails.contains(*email)
                && !managed.invite_emails.contains(*email)
                && !managed.tracked_emails.contains(*email)
        })
        .cloned()
        .collect();

    let mut to_disable = managed
        .enabled_invite_emails
        .difference(source)
        .map(|email| {
            managed
                .id_by_invite_email
                .get(email)
                .cloned()
                .ok_or_else(|| ReconcileError::UnindexedEmail(email.clone()))
        })
        .collect::<Result<BTreeSet<AccountId>, _>>()?;
    to_disable.retain(|id| !listed_at_remote(id, source, remote));

    let to_enable = managed
        .disabled_invite_emails
        .union(&remote.disabled_emails)
        .filter(|email| source.contains(*email))
        .filter_map(|email| resolve_managed_id(email, managed, remote))
        .filter(|id| remote.contains(id) && !to_disable.contains(id))
        .collect();

    Ok(ChangeSet {
        to_invite,
        to_disable,
        to_enable,
    })
}

fn listed_at_remote(id: &AccountId, source: &BTreeSet<String>, remote: &RemoteIndex) -> bool {
    remote
        .by_id
        .get(id)
        .is_some_and(|account| source.contains(&account.email))
}

/// Maps an email to the managed account it belongs to
///
/// Invite emails win. A remote email only resolves when the remote account
/// carrying it is managed; unmanaged accounts are never touched.
fn resolve_managed_id(
    email: &str,
    managed: &ManagedIndex,
    remote: &RemoteIndex,
) -> Option<AccountId> {
    if let Some(id) = managed.id_by_invite_email.get(email) {
        return Some(id.clone());
    }
    remote
        .id_by_email
        .get(email)
        .filter(|id| managed.contains(id))
        .cloned()
}
