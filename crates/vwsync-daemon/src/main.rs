//! vwsync Daemon - Background reconciliation service
//!
//! Runs the reconciliation loop between the configured member source, the
//! Vaultwarden admin API and the local ledger until SIGTERM/SIGINT.
//!
//! # Configuration
//!
//! Settings are layered: YAML file, then command-line flags, then
//! environment variables. `--reset` and `--adopt` imply `--runonce`.

mod cli;
mod logfile;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use vwsync_core::config::{Config, DirectoryBackend, LoggingConfig, ValidationError};
use vwsync_core::ports::{IEmailSource, IRemoteDirectory};
use vwsync_ledger::{DatabasePool, SqliteLedger};
use vwsync_source::build_email_source;
use vwsync_sync::{Heartbeat, PassLoop, PassMode, Reconciler, ReconcilerOptions};
use vwsync_vaultwarden::{AdminSession, InMemoryDirectory, VaultwardenClient, VaultwardenDirectory};

use crate::cli::Args;
use crate::logfile::{RotatingFile, DEFAULT_BACKUPS, DEFAULT_MAX_BYTES};

// ============================================================================
// Configuration
// ============================================================================

/// Builds the effective configuration
///
/// Returns the configuration together with every problem found, so all of
/// them can be reported at once after logging is up. `env` resolves the
/// environment variables applied on top of the flags.
fn load_config<F>(args: &Args, env: F) -> Result<(Config, Vec<ValidationError>)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path()),
    };

    args.apply(&mut config);
    let mut problems = config.apply_env_overrides(env);

    if config.sync.reset || config.sync.adopt {
        config.sync.run_once = true;
    }

    problems.extend(config.validate());
    Ok((config, problems))
}

// ============================================================================
// Logging
// ============================================================================

/// Installs the global subscriber
///
/// `RUST_LOG` wins over the configured level. The log file, when set, gets
/// the same events without ANSI colours and rotates at 5 MiB, keeping five
/// backups.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = match &logging.file {
        Some(path) => {
            let file = RotatingFile::open(path, DEFAULT_MAX_BYTES, DEFAULT_BACKUPS)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();
    Ok(())
}

// ============================================================================
// Wiring
// ============================================================================

fn build_directory(config: &Config) -> Result<Arc<dyn IRemoteDirectory>> {
    let vaultwarden = &config.vaultwarden;
    match vaultwarden.backend {
        DirectoryBackend::Live => {
            let session = Arc::new(AdminSession::new(vaultwarden.admin_token.clone()));
            let client = VaultwardenClient::new(
                vaultwarden.url.clone(),
                session,
                Duration::from_secs(vaultwarden.request_timeout_secs),
            )
            .context("Failed to create Vaultwarden client")?;
            Ok(Arc::new(VaultwardenDirectory::new(client)))
        }
        DirectoryBackend::Memory => {
            warn!("Using the in-memory directory, no real accounts will be touched");
            Ok(Arc::new(InMemoryDirectory::new()))
        }
    }
}

async fn build_reconciler(config: &Config) -> Result<Reconciler> {
    let source: Arc<dyn IEmailSource> = Arc::from(build_email_source(&config.source));
    let remote = build_directory(config)?;

    let pool = DatabasePool::new(&config.ledger.path)
        .await
        .context("Failed to open ledger")?;
    let ledger = Arc::new(SqliteLedger::new(pool.pool().clone()));

    Ok(Reconciler::new(
        source,
        remote,
        ledger,
        ReconcilerOptions::from_config(&config.sync),
    ))
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

async fn run(config: Config) -> Result<()> {
    let sync = &config.sync;
    info!(
        dry_run = sync.dry_run,
        source = ?config.source.kind,
        backend = ?config.vaultwarden.backend,
        vaultwarden_url = %config.vaultwarden.url,
        ledger = %config.ledger.path.display(),
        "vwsync daemon starting (vwsyncd)"
    );

    let reconciler = Arc::new(build_reconciler(&config).await?);

    if sync.reset {
        reconciler.reset().await?;
        warn!("Exiting after ledger reset");
        return Ok(());
    }

    let mode = if sync.adopt {
        warn!(dry_run = sync.dry_run, "Running in adoption mode, will exit after this pass");
        PassMode::Adopt
    } else {
        PassMode::Normal
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    PassLoop::new(reconciler, Duration::from_secs(sync.interval_secs), shutdown)
        .with_mode(mode)
        .with_run_once(sync.run_once)
        .with_heartbeat(Heartbeat::new(sync.heartbeat_file.clone()))
        .run()
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, problems) = load_config(&args, |name| std::env::var(name).ok())?;
    init_tracing(&config.logging)?;

    if !problems.is_empty() {
        for problem in &problems {
            error!(field = %problem.field, "{}", problem.message);
        }
        anyhow::bail!("Invalid configuration ({} problem(s))", problems.len());
    }

    let result = run(config).await;
    match &result {
        Ok(()) => info!("vwsync daemon shut down gracefully"),
        Err(e) => error!(error = %format!("{e:#}"), "vwsync daemon exiting with error"),
    }
    result
}

// ============================================================================
// Tests
// ============================================================================
