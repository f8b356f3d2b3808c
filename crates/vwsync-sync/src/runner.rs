//! Interval loop around [`Reconciler::run_pass`]
//!
//! A failed pass is logged and retried after the normal interval; there is
//! no backoff. The loop ends when the shutdown token is cancelled, or after
//! the first pass in run-once mode.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::heartbeat::Heartbeat;
use crate::reconciler::{PassMode, PassReport, Reconciler};

/// Counters collected while the loop ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopOutcome {
    pub passes: u64,
    pub failures: u64,
}

pub struct PassLoop {
    reconciler: Arc<Reconciler>,
    mode: PassMode,
    interval: Duration,
    run_once: bool,
    heartbeat: Option<Heartbeat>,
    shutdown: CancellationToken,
}

impl PassLoop {
    pub fn new(reconciler: Arc<Reconciler>, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            reconciler,
            mode: PassMode::Normal,
            interval,
            run_once: false,
            heartbeat: None,
            shutdown,
        }
    }

    pub fn with_mode(mut self, mode: PassMode) -> Self {
        self.mode = mode;
        self
    }

    /// Stop after the first pass and return its error, if any
    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    pub async fn run(&self) -> Result<LoopOutcome> {
        let mut outcome = LoopOutcome::default();
        info!(
            interval_secs = self.interval.as_secs(),
            run_once = self.run_once,
            mode = ?self.mode,
            "Sync loop starting"
        );

        while !self.shutdown.is_cancelled() {
            let result = self.reconciler.run_pass(self.mode).await;
            outcome.passes += 1;

            if self.run_once {
                let report = result?;
                log_report(&report);
                info!("Exiting after a single pass as requested");
                return Ok(outcome);
            }

            match result {
                Ok(report) => {
                    log_report(&report);
                    if let Some(heartbeat) = &self.heartbeat {
                        if let Err(e) = heartbeat.touch().await {
                            warn!(error = %format!("{e:#}"), "Heartbeat not updated");
                        }
                    }
                }
                Err(e) => {
                    outcome.failures += 1;
                    error!(error = %format!("{e:#}"), "Sync pass failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!(passes = outcome.passes, failures = outcome.failures, "Sync loop terminated");
        Ok(outcome)
    }
}

fn log_report(report: &PassReport) {
    info!(
        dry_run = report.dry_run,
        adopted = report.adopted,
        invited = report.invited,
        disabled = report.disabled,
        enabled = report.enabled,
        ledger_deleted = report.marked_deleted,
        ledger_disabled = report.marked_disabled,
        emails_updated = report.emails_updated,
        untied = report.untied,
        skipped_duplicates = report.skipped_duplicates,
        threshold_exceeded = report.threshold_exceeded,
        "Sync pass completed"
    );
}
