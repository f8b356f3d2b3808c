//! Drift detection
//!
//! Compares the indexed snapshots pairwise. Accounts are always paired by id;
//! email text is only used for the source axis, which has no ids.

use std::collections::BTreeSet;

use super::index::{ManagedIndex, RemoteIndex};
use super::result::{Drift, EmailChange};
use crate::domain::AccountId;

pub(crate) fn detect(
    source: &BTreeSet<String>,
    managed: &ManagedIndex,
    remote: &RemoteIndex,
) -> Drift {
    let vanished_in_remote: BTreeSet<AccountId> = managed
        .ids()
        .filter(|id| !remote.contains(id))
        .cloned()
        .collect();

    let disabled_in_remote = remote
        .disabled_ids
        .intersection(&managed.enabled_ids)
        .cloned()
        .collect();

    let enabled_in_remote = remote
        .enabled_ids
        .intersection(&managed.disabled_ids)
        .cloned()
        .collect();

    let email_changes: Vec<EmailChange> = managed
        .by_id
        .values()
        .filter_map(|account| {
            let current = remote.by_id.get(&account.id)?;
            (current.email != account.tracked_email).then(|| EmailChange {
                id: account.id.clone(),
                old_email: account.tracked_email.clone(),
                new_email: current.email.clone(),
            })
        })
        .collect();

    // Tracked emails as they will be once the changes above are recorded
    let effective_tracked: BTreeSet<&String> = managed
        .by_id
        .values()
        .map(|account| {
            remote
                .by_id
                .get(&account.id)
                .map_or(&account.tracked_email, |current| &current.email)
        })
        .collect();
    let vanished_in_both = effective_tracked
        .into_iter()
        .filter(|email| !remote.emails.contains(*email) && !source.contains(*email))
        .cloned()
        .collect();

    let adoption_candidates = source
        .intersection(&remote.emails)
        .filter(|email| !managed.invite_emails.contains(*email))
        .filter_map(|email| remote.id_by_email.get(email))
        .filter(|id| !managed.contains(id))
        .filter_map(|id| remote.by_id.get(id).cloned())
        .collect();

    Drift {
        vanished_in_remote,
        disabled_in_remote,
        enabled_in_remote,
        email_changes,
        vanished_in_both,
        adoption_candidates,
    }
}
