//! Command-line flags of `vwsyncd`
//!
//! Flags override the configuration file; environment variables are applied
//! afterwards and override both.

use std::path::PathBuf;

use clap::Parser;

use vwsync_core::config::{normalize_log_level, Config};

#[derive(Debug, Parser)]
#[command(
    name = "vwsyncd",
    version,
    about = "Keeps source member emails and Vaultwarden accounts in sync",
    after_help = "Environment variables take precedence over flags"
)]
pub struct Args {
    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level (LOGLEVEL)
    #[arg(long, value_parser = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE", "error", "warn", "info", "debug", "trace"])]
    pub loglevel: Option<String>,

    /// Append logs to this file as well (LOGFILE)
    #[arg(long, value_name = "PATH")]
    pub logfile: Option<PathBuf>,

    /// Log every change but apply none (DRYRUN)
    #[arg(long)]
    pub dryrun: bool,

    /// Terminate after the first pass
    #[arg(long)]
    pub runonce: bool,

    /// Seconds between passes (SYNC_INTERVAL_SECONDS)
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Largest number of invites, disables and enables applied in one pass (MAX_USERS_AT_ONCE)
    #[arg(long, value_name = "COUNT", alias = "override_safe_guard")]
    pub override_safe_guard: Option<usize>,

    /// File touched after every successful pass (HEARTBEAT_FILE)
    #[arg(long, value_name = "PATH", alias = "heartbeat_file")]
    pub heartbeat_file: Option<PathBuf>,

    /// Clear the ledger, untying every account from management, then exit (VUS_RESET)
    #[arg(long)]
    pub reset: bool,

    /// Adopt accounts present in both the source and Vaultwarden, then exit (VUS_ADOPT)
    #[arg(long)]
    pub adopt: bool,
}

impl Args {
    /// Copies every flag that was given onto `config`
    ///
    /// Switches only ever turn settings on.
    pub fn apply(&self, config: &mut Config) {
        if let Some(level) = &self.loglevel {
            config.logging.level = normalize_log_level(level);
        }
        if let Some(file) = &self.logfile {
            config.logging.file = Some(file.clone());
        }
        if let Some(secs) = self.interval {
            config.sync.interval_secs = secs;
        }
        if let Some(max) = self.override_safe_guard {
            config.sync.safety_threshold = max;
        }
        if let Some(path) = &self.heartbeat_file {
            config.sync.heartbeat_file = path.clone();
        }
        config.sync.dry_run |= self.dryrun;
        config.sync.run_once |= self.runonce;
        config.sync.reset |= self.reset;
        config.sync.adopt |= self.adopt;
    }
}
