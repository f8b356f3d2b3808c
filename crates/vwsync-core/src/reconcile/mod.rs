//! Reconciliation engine
//!
//! [`reconcile`] is a pure function of three snapshots:
//!
//! - the source member emails (authoritative),
//! - the remote directory's accounts,
//! - the ledger's managed accounts (what this system last applied or observed).
//!
//! It reports drift between the views and plans the invites, disables, and
//! enables that move the remote directory toward the source. Accounts an
//! operator changed by hand show up as drift instead of being reverted.
//!
//! ## Invariants
//!
//! - Same inputs, same [`SyncResult`]. All collections are ordered.
//! - `to_disable` and `to_enable` never share an id.
//! - Records are paired by [`AccountId`](crate::domain::AccountId), never by email.

mod drift;
mod error;
mod index;
mod plan;
mod result;

use std::collections::BTreeSet;

pub use error::ReconcileError;
pub use result::{ChangeSet, Drift, EmailChange, Summary, SyncResult};

use crate::domain::{ManagedAccount, RemoteAccount};
use index::{ManagedIndex, RemoteIndex};

/// Compares the three snapshots and plans the mutations needed to converge
///
/// # Errors
/// Fails with [`ReconcileError`] if a snapshot violates its uniqueness
/// invariants (duplicate ids, duplicate invite emails in the ledger).
pub fn reconcile(
    source: &BTreeSet<String>,
    remote: &[RemoteAccount],
    managed: &[ManagedAccount],
) -> Result<SyncResult, ReconcileError> {
    let managed = ManagedIndex::build(managed)?;
    let remote = RemoteIndex::build(remote)?;

    let drift = drift::detect(source, &managed, &remote);
    let plan = plan::plan(source, &managed, &remote)?;

    Ok(SyncResult::new(drift, plan, managed.by_id, remote.by_id))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::{AccountId, LedgerState};

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn emails(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn two_enabled() -> (Vec<ManagedAccount>, Vec<RemoteAccount>) {
        (
            vec![
                ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled),
                ManagedAccount::new(id("u2"), "b@test.com", LedgerState::Enabled),
            ],
            vec![
                RemoteAccount::new(id("u1"), "a@test.com", true),
                RemoteAccount::new(id("u2"), "b@test.com", true),
            ],
        )
    }

    /// Applies a plan and its drift corrections the way the driver does,
    /// returning the next pass's snapshots. Invited accounts get ids `new-<n>`.
    fn apply(
        result: &SyncResult,
        remote: &[RemoteAccount],
        managed: &[ManagedAccount],
    ) -> (Vec<RemoteAccount>, Vec<ManagedAccount>) {
        let mut remote: BTreeMap<AccountId, RemoteAccount> =
            remote.iter().map(|r| (r.id.clone(), r.clone())).collect();
        let mut managed: BTreeMap<AccountId, ManagedAccount> =
            managed.iter().map(|m| (m.id.clone(), m.clone())).collect();

        for id in &result.drift.vanished_in_remote {
            managed.get_mut(id).unwrap().state = LedgerState::Deleted;
        }
        for id in &result.drift.disabled_in_remote {
            managed.get_mut(id).unwrap().state = LedgerState::Disabled;
        }
        for change in &result.drift.email_changes {
            managed.get_mut(&change.id).unwrap().tracked_email = change.new_email.clone();
        }
        for (n, email) in result.plan.to_invite.iter().enumerate() {
            let new_id = id(&format!("new-{n}"));
            remote.insert(new_id.clone(), RemoteAccount::new(new_id.clone(), email, true));
            managed.insert(
                new_id.clone(),
                ManagedAccount::new(new_id, email, LedgerState::Enabled),
            );
        }
        for id in &result.plan.to_disable {
            if let Some(r) = remote.get_mut(id) {
                r.enabled = false;
            }
            managed.get_mut(id).unwrap().state = LedgerState::Disabled;
        }
        for id in &result.plan.to_enable {
            remote.get_mut(id).unwrap().enabled = true;
            managed.get_mut(id).unwrap().state = LedgerState::Enabled;
        }

        (
            remote.into_values().collect(),
            managed.into_values().collect(),
        )
    }

    // -- Scenarios --

    #[test]
    fn test_in_sync_plans_nothing() {
        let (managed, remote) = two_enabled();
        let result = reconcile(&emails(&["a@test.com", "b@test.com"]), &remote, &managed).unwrap();
        assert!(result.plan.is_empty());
        assert_eq!(result.drift, Drift::default());
    }

    #[test]
    fn test_member_leaving_source_is_disabled() {
        let (managed, remote) = two_enabled();
        let result = reconcile(&emails(&["a@test.com"]), &remote, &managed).unwrap();
        assert_eq!(result.plan.to_disable, BTreeSet::from([id("u2")]));
        assert!(result.plan.to_invite.is_empty());
        assert!(result.plan.to_enable.is_empty());
    }

    #[test]
    fn test_new_member_is_invited() {
        let (managed, remote) = two_enabled();
        let result = reconcile(
            &emails(&["a@test.com", "b@test.com", "c@test.com"]),
            &remote,
            &managed,
        )
        .unwrap();
        assert_eq!(result.plan.to_invite, emails(&["c@test.com"]));
        assert!(result.plan.to_disable.is_empty());
        assert!(result.plan.to_enable.is_empty());
    }

    #[test]
    fn test_disabled_at_remote_only_is_reported() {
        let (managed, mut remote) = two_enabled();
        remote[0].enabled = false;
        let result = reconcile(&emails(&["a@test.com", "b@test.com"]), &remote, &managed).unwrap();
        assert_eq!(result.drift.disabled_in_remote, BTreeSet::from([id("u1")]));
    }

    #[test]
    fn test_deleted_at_remote_is_reported() {
        let (managed, mut remote) = two_enabled();
        remote.remove(0);
        let result = reconcile(&emails(&["a@test.com", "b@test.com"]), &remote, &managed).unwrap();
        assert_eq!(result.drift.vanished_in_remote, BTreeSet::from([id("u1")]));
        assert!(result.plan.to_enable.is_empty());
        assert!(result.plan.to_invite.is_empty());
    }

    #[test]
    fn test_duplicate_invite_email_fails_the_pass() {
        let managed = vec![
            ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled),
            ManagedAccount::new(id("u2"), "a@test.com", LedgerState::Enabled),
        ];
        let err = reconcile(&emails(&[]), &[], &managed).unwrap_err();
        assert!(matches!(err, ReconcileError::DuplicateInviteEmail { .. }));
    }

    #[test]
    fn test_lookup_tables_cover_both_snapshots() {
        let (managed, mut remote) = two_enabled();
        remote.push(RemoteAccount::new(id("u9"), "manual@test.com", true));
        let result = reconcile(&emails(&["a@test.com"]), &remote, &managed).unwrap();
        assert_eq!(result.managed(&id("u2")).unwrap().invite_email, "b@test.com");
        assert!(result.managed(&id("u9")).is_none());
        assert_eq!(result.remote(&id("u9")).unwrap().email, "manual@test.com");
        assert_eq!(result.display_email(&id("u9")), "manual@test.com");
        assert_eq!(result.display_email(&id("zz")), "zz");
    }

    #[test]
    fn test_summary_counts() {
        let (managed, mut remote) = two_enabled();
        remote[1].enabled = false;
        let result = reconcile(&emails(&["a@test.com", "c@test.com"]), &remote, &managed).unwrap();
        let summary = result.summary();
        assert_eq!(summary.disabled_in_remote, 1);
        assert_eq!(summary.to_invite, 1);
        assert_eq!(summary.to_disable, 1);
        assert_eq!(summary.to_enable, 0);
        assert_eq!(summary.planned(), result.plan.total());
    }

    // -- Properties --

    #[test]
    fn test_idempotent_for_identical_snapshots() {
        let (managed, mut remote) = two_enabled();
        remote[0].email = "renamed@test.com".into();
        remote.push(RemoteAccount::new(id("u9"), "c@test.com", false));
        let source = emails(&["a@test.com", "c@test.com", "d@test.com"]);

        let first = reconcile(&source, &remote, &managed).unwrap();
        let second = reconcile(&source, &remote, &managed).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let (mut managed, mut remote) = two_enabled();
        let source = emails(&["a@test.com", "c@test.com"]);
        let forward = reconcile(&source, &remote, &managed).unwrap();
        managed.reverse();
        remote.reverse();
        let backward = reconcile(&source, &remote, &managed).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_converges_after_applying_plan() {
        let managed = vec![
            ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled),
            ManagedAccount::new(id("u2"), "b@test.com", LedgerState::Enabled),
            ManagedAccount::new(id("u3"), "c@test.com", LedgerState::Disabled),
            ManagedAccount::new(id("u4"), "d@test.com", LedgerState::Enabled),
        ];
        let remote = vec![
            RemoteAccount::new(id("u1"), "a@test.com", true),
            RemoteAccount::new(id("u2"), "b.renamed@test.com", true),
            RemoteAccount::new(id("u3"), "c@test.com", false),
        ];
        let source = emails(&["a@test.com", "c@test.com", "e@test.com", "f@test.com"]);

        let first = reconcile(&source, &remote, &managed).unwrap();
        assert!(!first.plan.is_empty());
        let (remote, managed) = apply(&first, &remote, &managed);
        let second = reconcile(&source, &remote, &managed).unwrap();
        assert!(second.plan.is_empty(), "unexpected plan: {:?}", second.plan);
    }

    #[test]
    fn test_member_renamed_in_source_and_remote_stays_settled() {
        let source = emails(&["b@test.com"]);
        let mut managed = vec![ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled)];
        let mut remote = vec![RemoteAccount::new(id("u1"), "b@test.com", true)];

        for pass in 1..=4 {
            let result = reconcile(&source, &remote, &managed).unwrap();
            assert!(result.plan.is_empty(), "pass {pass} planned {:?}", result.plan);
            (remote, managed) = apply(&result, &remote, &managed);
        }
        assert!(remote[0].enabled);
        assert_eq!(managed[0].state, LedgerState::Enabled);
        assert_eq!(managed[0].tracked_email, "b@test.com");
    }

    #[test]
    fn test_renamed_member_disabled_at_remote_settles_enabled() {
        let source = emails(&["b@test.com"]);
        let mut managed = vec![ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled)];
        let mut remote = vec![RemoteAccount::new(id("u1"), "b@test.com", false)];

        let first = reconcile(&source, &remote, &managed).unwrap();
        assert_eq!(first.plan.to_enable, BTreeSet::from([id("u1")]));
        (remote, managed) = apply(&first, &remote, &managed);

        for pass in 2..=4 {
            let result = reconcile(&source, &remote, &managed).unwrap();
            assert!(result.plan.is_empty(), "pass {pass} planned {:?}", result.plan);
            (remote, managed) = apply(&result, &remote, &managed);
        }
        assert!(remote[0].enabled);
    }

    #[test]
    fn test_disable_and_enable_are_disjoint() {
        let cases: Vec<(Vec<ManagedAccount>, Vec<RemoteAccount>, BTreeSet<String>)> = vec![
            (
                vec![ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Enabled)],
                vec![RemoteAccount::new(id("u1"), "b@test.com", false)],
                emails(&["b@test.com"]),
            ),
            (
                vec![
                    ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Disabled),
                    ManagedAccount::new(id("u2"), "b@test.com", LedgerState::Enabled),
                ],
                vec![
                    RemoteAccount::new(id("u1"), "b@test.com", false),
                    RemoteAccount::new(id("u2"), "a@test.com", false),
                ],
                emails(&["a@test.com", "b@test.com"]),
            ),
            (
                vec![ManagedAccount::new(id("u1"), "a@test.com", LedgerState::Deleted)],
                vec![RemoteAccount::new(id("u1"), "a@test.com", false)],
                emails(&[]),
            ),
        ];
        for (managed, remote, source) in cases {
            let result = reconcile(&source, &remote, &managed).unwrap();
            assert!(
                result.plan.to_disable.is_disjoint(&result.plan.to_enable),
                "overlap in {:?}",
                result.plan
            );
        }
    }

    #[test]
    fn test_email_change_not_reported_as_vanished() {
        let managed = vec![ManagedAccount::new(id("x"), "a@test.com", LedgerState::Enabled)];
        let remote = vec![RemoteAccount::new(id("x"), "b@test.com", true)];
        let result = reconcile(&emails(&["a@test.com"]), &remote, &managed).unwrap();
        assert!(result.drift.vanished_in_both.is_empty());
        assert_eq!(result.drift.email_changes.len(), 1);
    }

    #[test]
    fn test_lost_ledger_write_is_detected_next_pass() {
        // Disable reached the remote directory, the ledger write did not
        let (managed, remote) = two_enabled();
        let source = emails(&["a@test.com"]);
        let first = reconcile(&source, &remote, &managed).unwrap();
        assert_eq!(first.plan.to_disable, BTreeSet::from([id("u2")]));

        let remote_after: Vec<RemoteAccount> = remote
            .into_iter()
            .map(|mut r| {
                if r.id == id("u2") {
                    r.enabled = false;
                }
                r
            })
            .collect();
        let second = reconcile(&source, &remote_after, &managed).unwrap();
        assert_eq!(second.drift.disabled_in_remote, BTreeSet::from([id("u2")]));

        let (remote_next, managed_next) = apply(&second, &remote_after, &managed);
        let third = reconcile(&source, &remote_next, &managed_next).unwrap();
        assert!(third.plan.is_empty());
        assert!(third.drift.disabled_in_remote.is_empty());
    }
}
