//! Single reconciliation pass
//!
//! The [`Reconciler`] fetches the three snapshots, runs the pure engine and
//! applies its output through the ports.
//!
//! ## Pass Order
//!
//! 1. **Adoption** (adopt mode only): register unmanaged remote accounts
//!    whose email is in the source
//! 2. **Ledger drift corrections**: vanished in both (policy), vanished in
//!    remote, disabled in remote, email changes, re-enabled in remote (policy)
//! 3. **Safety threshold**: skip the whole plan when it is too large
//! 4. **Plan**: invites, then disables, then enables
//!
//! Every remote mutation is followed immediately by its ledger write. Any
//! collaborator error aborts the pass; the next pass picks up from whatever
//! state the remote directory and the ledger ended up in.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use vwsync_core::config::{ReenabledPolicy, SyncConfig};
use vwsync_core::domain::{AccountId, LedgerState, RemoteAccount};
use vwsync_core::ports::{IEmailSource, ILedger, IRemoteDirectory, LedgerError};
use vwsync_core::reconcile::{reconcile, Summary, SyncResult};

// ============================================================================
// Options and report
// ============================================================================

/// Behaviour switches for a [`Reconciler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Log every action but perform no mutation
    pub dry_run: bool,
    /// Largest plan (invites + disables + enables) applied in one pass
    pub safety_threshold: usize,
    /// Delete ledger rows of accounts gone from both source and remote
    pub cleanup_vanished: bool,
    /// What to do with accounts an operator re-enabled by hand
    pub reenabled_policy: ReenabledPolicy,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl ReconcilerOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            safety_threshold: config.safety_threshold,
            cleanup_vanished: config.cleanup_vanished,
            reenabled_policy: config.reenabled_policy,
        }
    }
}

/// Whether a pass registers adoption candidates first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PassMode {
    #[default]
    Normal,
    Adopt,
}

/// What one pass did (or, in dry run, would have done)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub adopted: usize,
    pub cleaned_up: usize,
    pub marked_deleted: usize,
    pub marked_disabled: usize,
    pub emails_updated: usize,
    pub reenabled_mirrored: usize,
    pub untied: usize,
    pub invited: usize,
    pub disabled: usize,
    pub enabled: usize,
    /// Registrations the ledger rejected as duplicates
    pub skipped_duplicates: usize,
    /// The plan was larger than the safety threshold and was not applied
    pub threshold_exceeded: bool,
    pub dry_run: bool,
    /// Engine findings at the start of the pass
    pub summary: Summary,
}

impl PassReport {
    /// Number of remote mutations performed
    pub fn remote_mutations(&self) -> usize {
        self.invited + self.disabled + self.enabled
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// Drives one reconciliation pass through the ports
pub struct Reconciler {
    source: Arc<dyn IEmailSource>,
    remote: Arc<dyn IRemoteDirectory>,
    ledger: Arc<dyn ILedger>,
    options: ReconcilerOptions,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn IEmailSource>,
        remote: Arc<dyn IRemoteDirectory>,
        ledger: Arc<dyn ILedger>,
        options: ReconcilerOptions,
    ) -> Self {
        Self {
            source,
            remote,
            ledger,
            options,
        }
    }

    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    /// Truncates the ledger, untying every account from management
    pub async fn reset(&self) -> Result<()> {
        if !self.options.dry_run {
            self.ledger
                .truncate()
                .await
                .context("Failed to truncate ledger")?;
        }
        warn!(
            dry_run = self.options.dry_run,
            "Ledger reset, all accounts untied from management"
        );
        Ok(())
    }

    /// Runs one full pass
    #[tracing::instrument(skip(self), fields(dry_run = self.options.dry_run))]
    pub async fn run_pass(&self, mode: PassMode) -> Result<PassReport> {
        let result = self.snapshot_and_reconcile().await?;
        let summary = result.summary();
        debug!(%summary, "Reconciled snapshots");

        let mut report = PassReport {
            dry_run: self.options.dry_run,
            summary,
            ..PassReport::default()
        };

        if mode == PassMode::Adopt {
            self.adopt(&result.drift.adoption_candidates, &mut report)
                .await?;
        }
        self.correct_ledger(&result, &mut report).await?;

        let planned = result.plan.total();
        if planned > self.options.safety_threshold {
            warn!(
                planned,
                invite = result.plan.to_invite.len(),
                disable = result.plan.to_disable.len(),
                enable = result.plan.to_enable.len(),
                threshold = self.options.safety_threshold,
                "Planned changes exceed the safety threshold, skipping plan"
            );
            report.threshold_exceeded = true;
            return Ok(report);
        }

        self.apply_plan(&result, &mut report).await?;
        Ok(report)
    }

    async fn snapshot_and_reconcile(&self) -> Result<SyncResult> {
        let source = self
            .source
            .list_member_emails()
            .await
            .with_context(|| format!("Failed to fetch member emails from {}", self.source.name()))?;
        let remote = self
            .remote
            .list_accounts()
            .await
            .context("Failed to list remote accounts")?;
        let managed = self
            .ledger
            .list_managed_accounts()
            .await
            .context("Failed to read ledger")?;

        debug!(
            source = source.len(),
            remote = remote.len(),
            managed = managed.len(),
            "Fetched snapshots"
        );

        reconcile(&source, &remote, &managed).context("Snapshots violate reconciliation invariants")
    }

    // ========================================================================
    // Ledger corrections
    // ========================================================================

    async fn adopt(&self, candidates: &[RemoteAccount], report: &mut PassReport) -> Result<()> {
        if candidates.is_empty() {
            info!("Nothing to adopt");
            return Ok(());
        }

        for account in candidates {
            let state = LedgerState::from_enabled(account.enabled);
            if !self.options.dry_run
                && !self.register_or_skip(&account.email, &account.id, state, report).await?
            {
                continue;
            }
            info!(
                dry_run = self.options.dry_run,
                account_id = %account.id,
                email = %account.email,
                %state,
                "Adopted account"
            );
            report.adopted += 1;
        }
        Ok(())
    }

    async fn correct_ledger(&self, result: &SyncResult, report: &mut PassReport) -> Result<()> {
        let drift = &result.drift;
        let dry_run = self.options.dry_run;

        if self.options.cleanup_vanished {
            for email in &drift.vanished_in_both {
                if !dry_run {
                    self.ledger
                        .delete_by_email(email)
                        .await
                        .with_context(|| format!("Failed to clean up {email}"))?;
                }
                info!(dry_run, email = %email, "Cleaned up vanished account");
                report.cleaned_up += 1;
            }
        }

        for id in &drift.vanished_in_remote {
            self.mark(result, id, LedgerState::Deleted).await?;
            report.marked_deleted += 1;
        }

        for id in &drift.disabled_in_remote {
            self.mark(result, id, LedgerState::Disabled).await?;
            report.marked_disabled += 1;
        }

        for change in &drift.email_changes {
            if !dry_run {
                self.ledger
                    .update_tracked_email(&change.id, &change.new_email)
                    .await
                    .with_context(|| format!("Failed to update tracked email of {}", change.id))?;
            }
            info!(
                dry_run,
                account_id = %change.id,
                old_email = %change.old_email,
                new_email = %change.new_email,
                "Tracked email changed"
            );
            report.emails_updated += 1;
        }

        self.handle_reenabled(result, &drift.enabled_in_remote, report)
            .await
    }

    async fn handle_reenabled(
        &self,
        result: &SyncResult,
        ids: &BTreeSet<AccountId>,
        report: &mut PassReport,
    ) -> Result<()> {
        for id in ids {
            let email = invite_email(result, id);
            match self.options.reenabled_policy {
                ReenabledPolicy::Ignore => {
                    debug!(account_id = %id, email = %email, "Account re-enabled by operator, ignoring");
                }
                ReenabledPolicy::Mirror => {
                    self.mark(result, id, LedgerState::Enabled).await?;
                    report.reenabled_mirrored += 1;
                }
                ReenabledPolicy::Untie => {
                    if !self.options.dry_run {
                        self.ledger
                            .delete_by_id(id)
                            .await
                            .with_context(|| format!("Failed to untie {email}"))?;
                    }
                    warn!(
                        dry_run = self.options.dry_run,
                        account_id = %id,
                        email = %email,
                        "Account re-enabled by operator, untied from management"
                    );
                    report.untied += 1;
                }
            }
        }
        Ok(())
    }

    async fn mark(&self, result: &SyncResult, id: &AccountId, state: LedgerState) -> Result<()> {
        let email = invite_email(result, id);
        if !self.options.dry_run {
            self.ledger
                .set_state(id, state)
                .await
                .with_context(|| format!("Failed to set state of {email} to {state}"))?;
        }
        info!(
            dry_run = self.options.dry_run,
            account_id = %id,
            email = %email,
            %state,
            "Ledger state updated"
        );
        Ok(())
    }

    /// Registers an account, treating a duplicate as a skip
    ///
    /// Returns whether the row was written.
    async fn register_or_skip(
        &self,
        email: &str,
        id: &AccountId,
        state: LedgerState,
        report: &mut PassReport,
    ) -> Result<bool> {
        match self.ledger.register(email, id, state).await {
            Ok(()) => Ok(true),
            Err(e) => match e.downcast_ref::<LedgerError>() {
                Some(duplicate @ LedgerError::Duplicate { .. }) => {
                    warn!(account_id = %id, email = %email, error = %duplicate, "Skipping registration");
                    report.skipped_duplicates += 1;
                    Ok(false)
                }
                _ => Err(e.context(format!("Failed to register {email}"))),
            },
        }
    }

    // ========================================================================
    // Plan
    // ========================================================================

    async fn apply_plan(&self, result: &SyncResult, report: &mut PassReport) -> Result<()> {
        let plan = &result.plan;
        let dry_run = self.options.dry_run;

        for email in &plan.to_invite {
            if !dry_run {
                let id = self
                    .remote
                    .invite(email)
                    .await
                    .with_context(|| format!("Failed to invite {email}"))?;
                if !self
                    .register_or_skip(email, &id, LedgerState::Enabled, report)
                    .await?
                {
                    continue;
                }
                info!(account_id = %id, email = %email, "Invited account");
            } else {
                info!(dry_run, email = %email, "Invited account");
            }
            report.invited += 1;
        }

        for id in &plan.to_disable {
            let email = result.display_email(id);
            if !dry_run {
                self.remote
                    .disable(id)
                    .await
                    .with_context(|| format!("Failed to disable {email}"))?;
                self.ledger
                    .set_state(id, LedgerState::Disabled)
                    .await
                    .with_context(|| format!("Failed to record {email} as disabled"))?;
            }
            info!(dry_run, account_id = %id, email = %email, "Disabled account");
            report.disabled += 1;
        }

        for id in &plan.to_enable {
            let email = result.display_email(id);
            if !dry_run {
                self.remote
                    .enable(id)
                    .await
                    .with_context(|| format!("Failed to enable {email}"))?;
                self.ledger
                    .set_state(id, LedgerState::Enabled)
                    .await
                    .with_context(|| format!("Failed to record {email} as enabled"))?;
            }
            info!(dry_run, account_id = %id, email = %email, "Enabled account");
            report.enabled += 1;
        }

        if plan.is_empty() {
            debug!("Nothing to change");
        }
        Ok(())
    }
}

fn invite_email(result: &SyncResult, id: &AccountId) -> String {
    result
        .managed(id)
        .map(|m| m.invite_email.clone())
        .unwrap_or_else(|| id.to_string())
}
