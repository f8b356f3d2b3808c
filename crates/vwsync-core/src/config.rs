//! Configuration module for vwsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, environment overrides, and a builder
//! pattern for programmatic use.
//!
//! Precedence, lowest first: YAML file, command-line flags (applied by the
//! daemon), environment variables ([`Config::apply_env_overrides`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for vwsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub vaultwarden: VaultwardenConfig,
    pub ledger: LedgerConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Which email source backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Query an LDAP directory.
    #[default]
    Ldap,
    /// Random prefix of a fixed test list. For trying the daemon out.
    Random,
    /// The `source.static_emails` list.
    Static,
}

/// Authoritative email source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub ldap: LdapConfig,
    /// Member list used when `kind` is `static`.
    pub static_emails: Vec<String>,
}

/// LDAP connection and query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapConfig {
    /// Host name (and optional port) of the LDAP server.
    pub server: String,
    /// `ldap` or `ldaps`.
    pub scheme: String,
    pub bind_dn: String,
    pub bind_password: String,
    /// Search base; the search covers the whole subtree.
    pub base_dn: String,
    pub search_filter: String,
    /// Attribute holding the member's email address.
    pub email_attribute: String,
    /// Connection timeout in seconds.
    pub timeout_secs: u64,
}

/// Which remote directory backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    /// The Vaultwarden admin API.
    #[default]
    Live,
    /// A process-local fake, for dry experiments.
    Memory,
}

/// Vaultwarden admin API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultwardenConfig {
    pub backend: DirectoryBackend,
    /// Base URL of the Vaultwarden instance, e.g. `https://vault.example.com`.
    pub url: String,
    /// Admin token used to obtain the `VW_ADMIN` session cookie.
    pub admin_token: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Local ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

/// What to do with a managed account an operator re-enabled at the remote
/// directory after this system had disabled it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReenabledPolicy {
    /// Report it and leave the ledger alone.
    #[default]
    Ignore,
    /// Record the account as enabled again.
    Mirror,
    /// Stop managing the account by deleting its ledger record.
    Untie,
}

/// Reconciliation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between passes.
    pub interval_secs: u64,
    /// Largest number of planned invites, disables, and enables applied in one pass.
    pub safety_threshold: usize,
    /// Log intended mutations without performing them.
    pub dry_run: bool,
    /// Exit after the first pass.
    pub run_once: bool,
    /// Truncate the ledger and exit.
    pub reset: bool,
    /// Adopt unmanaged remote accounts that match the source, run one pass, and exit.
    pub adopt: bool,
    /// Delete ledger records of accounts gone from both the source and the remote directory.
    pub cleanup_vanished: bool,
    pub reenabled_policy: ReenabledPolicy,
    /// Touched after every successful pass.
    pub heartbeat_file: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Optional file that receives a copy of the log output.
    pub file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    ///
    /// Missing sections and fields take their default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/vwsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("vwsync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            scheme: "ldaps".to_string(),
            bind_dn: String::new(),
            bind_password: String::new(),
            base_dn: String::new(),
            search_filter: "(objectClass=person)".to_string(),
            email_attribute: "email".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for VaultwardenConfig {
    fn default() -> Self {
        Self {
            backend: DirectoryBackend::Live,
            url: String::new(),
            admin_token: String::new(),
            request_timeout_secs: 5,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("vwsync")
                .join("ledger.db"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            safety_threshold: 20,
            dry_run: false,
            run_once: false,
            reset: false,
            adopt: false,
            cleanup_vanished: false,
            reenabled_policy: ReenabledPolicy::Ignore,
            heartbeat_file: PathBuf::from("/tmp/vwsync_healthy"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `source.ldap.scheme`.
const VALID_LDAP_SCHEMES: &[&str] = &["ldap", "ldaps"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Backend-specific
    /// settings are only checked for the backend that is selected.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- source ---
        if self.source.kind == SourceKind::Ldap {
            let ldap = &self.source.ldap;
            if ldap.server.trim().is_empty() {
                errors.push(ValidationError::new("source.ldap.server", "must not be empty"));
            }
            if !VALID_LDAP_SCHEMES.contains(&ldap.scheme.as_str()) {
                errors.push(ValidationError::new(
                    "source.ldap.scheme",
                    format!(
                        "invalid scheme '{}'; valid options: {}",
                        ldap.scheme,
                        VALID_LDAP_SCHEMES.join(", ")
                    ),
                ));
            }
            if ldap.base_dn.trim().is_empty() {
                errors.push(ValidationError::new("source.ldap.base_dn", "must not be empty"));
            }
            if ldap.search_filter.trim().is_empty() {
                errors.push(ValidationError::new(
                    "source.ldap.search_filter",
                    "must not be empty",
                ));
            }
            if ldap.email_attribute.trim().is_empty() {
                errors.push(ValidationError::new(
                    "source.ldap.email_attribute",
                    "must not be empty",
                ));
            }
            if ldap.timeout_secs == 0 {
                errors.push(ValidationError::new(
                    "source.ldap.timeout_secs",
                    "must be greater than 0",
                ));
            }
        }
        if self.source.kind == SourceKind::Static
            && self.source.static_emails.iter().any(|e| e.trim().is_empty())
        {
            errors.push(ValidationError::new(
                "source.static_emails",
                "must not contain empty entries",
            ));
        }

        // --- vaultwarden ---
        if self.vaultwarden.backend == DirectoryBackend::Live {
            let url = self.vaultwarden.url.as_str();
            if url.is_empty() {
                errors.push(ValidationError::new("vaultwarden.url", "must not be empty"));
            } else if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ValidationError::new(
                    "vaultwarden.url",
                    format!("must start with http:// or https://, got '{url}'"),
                ));
            }
            if self.vaultwarden.admin_token.is_empty() {
                errors.push(ValidationError::new(
                    "vaultwarden.admin_token",
                    "must not be empty",
                ));
            }
        }
        if self.vaultwarden.request_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "vaultwarden.request_timeout_secs",
                "must be greater than 0",
            ));
        }

        // --- ledger ---
        if self.ledger.path.as_os_str().is_empty() {
            errors.push(ValidationError::new("ledger.path", "must not be empty"));
        }

        // --- sync ---
        if self.sync.interval_secs == 0 {
            errors.push(ValidationError::new(
                "sync.interval_secs",
                "must be greater than 0",
            ));
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError::new(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Normalises a user supplied log level (`WARN`, `Info`, `warning`) to the
/// lowercase names accepted by `logging.level`.
pub fn normalize_log_level(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    match level.as_str() {
        "warning" => "warn".to_string(),
        _ => level,
    }
}

impl Config {
    /// Applies environment variable overrides using `lookup` to read variables.
    ///
    /// Boolean flags are switched on only by the exact value `"1"`; any other
    /// value leaves the current setting untouched. Numeric variables that do
    /// not parse are reported and ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Vec<ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();
        let flag = |name: &str| lookup(name).as_deref() == Some("1");

        // --- logging ---
        if let Some(level) = lookup("LOGLEVEL") {
            self.logging.level = normalize_log_level(&level);
        }
        if let Some(file) = lookup("LOGFILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        // --- sync ---
        if flag("DRYRUN") {
            self.sync.dry_run = true;
        }
        if let Some(raw) = lookup("SYNC_INTERVAL_SECONDS") {
            match raw.trim().parse() {
                Ok(secs) => self.sync.interval_secs = secs,
                Err(_) => errors.push(ValidationError::new(
                    "SYNC_INTERVAL_SECONDS",
                    format!("not a number of seconds: '{raw}'"),
                )),
            }
        }
        if let Some(raw) = lookup("MAX_USERS_AT_ONCE") {
            match raw.trim().parse() {
                Ok(max) => self.sync.safety_threshold = max,
                Err(_) => errors.push(ValidationError::new(
                    "MAX_USERS_AT_ONCE",
                    format!("not a non-negative integer: '{raw}'"),
                )),
            }
        }
        if let Some(file) = lookup("HEARTBEAT_FILE") {
            self.sync.heartbeat_file = PathBuf::from(file);
        }
        if flag("VUS_RESET") {
            self.sync.reset = true;
        }
        if flag("VUS_ADOPT") {
            self.sync.adopt = true;
        }
        if flag("CLEANUP_VANISHED_USERS") {
            self.sync.cleanup_vanished = true;
        }
        if flag("UNTIE_RE-ENABLED_USERS") {
            self.sync.reenabled_policy = ReenabledPolicy::Untie;
        }

        // --- ledger ---
        if let Some(path) = lookup("SQLITE_DB") {
            self.ledger.path = PathBuf::from(path);
        }

        // --- vaultwarden ---
        if let Some(url) = lookup("VAULTWARDEN_URL") {
            self.vaultwarden.url = url;
        }
        if let Some(token) = lookup("VAULTWARDEN_ADMIN_TOKEN") {
            self.vaultwarden.admin_token = token;
        }

        // --- source.ldap ---
        let ldap = &mut self.source.ldap;
        let strings: [(&str, &mut String); 7] = [
            ("LDAP_SERVER", &mut ldap.server),
            ("LDAP_SCHEME", &mut ldap.scheme),
            ("LDAP_BIND_DN", &mut ldap.bind_dn),
            ("LDAP_BIND_PW", &mut ldap.bind_password),
            ("LDAP_BASE_DN", &mut ldap.base_dn),
            ("LDAP_SEARCH_FILTER", &mut ldap.search_filter),
            ("LDAP_EMAIL_ATTR", &mut ldap.email_attribute),
        ];
        for (name, field) in strings {
            if let Some(value) = lookup(name) {
                *field = value;
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use vwsync_core::config::{ConfigBuilder, DirectoryBackend, SourceKind};
///
/// let config = ConfigBuilder::new()
///     .source_kind(SourceKind::Static)
///     .static_emails(vec!["a@example.com".to_string()])
///     .vaultwarden_backend(DirectoryBackend::Memory)
///     .sync_interval_secs(60)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- source ---

    pub fn source_kind(mut self, kind: SourceKind) -> Self {
        self.config.source.kind = kind;
        self
    }

    pub fn static_emails(mut self, emails: Vec<String>) -> Self {
        self.config.source.static_emails = emails;
        self
    }

    pub fn ldap(mut self, ldap: LdapConfig) -> Self {
        self.config.source.ldap = ldap;
        self
    }

    // --- vaultwarden ---

    pub fn vaultwarden_backend(mut self, backend: DirectoryBackend) -> Self {
        self.config.vaultwarden.backend = backend;
        self
    }

    pub fn vaultwarden_url(mut self, url: impl Into<String>) -> Self {
        self.config.vaultwarden.url = url.into();
        self
    }

    pub fn vaultwarden_admin_token(mut self, token: impl Into<String>) -> Self {
        self.config.vaultwarden.admin_token = token.into();
        self
    }

    pub fn vaultwarden_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.vaultwarden.request_timeout_secs = secs;
        self
    }

    // --- ledger ---

    pub fn ledger_path(mut self, path: PathBuf) -> Self {
        self.config.ledger.path = path;
        self
    }

    // --- sync ---

    pub fn sync_interval_secs(mut self, secs: u64) -> Self {
        self.config.sync.interval_secs = secs;
        self
    }

    pub fn sync_safety_threshold(mut self, max: usize) -> Self {
        self.config.sync.safety_threshold = max;
        self
    }

    pub fn sync_dry_run(mut self, dry_run: bool) -> Self {
        self.config.sync.dry_run = dry_run;
        self
    }

    pub fn sync_run_once(mut self, run_once: bool) -> Self {
        self.config.sync.run_once = run_once;
        self
    }

    pub fn sync_cleanup_vanished(mut self, cleanup: bool) -> Self {
        self.config.sync.cleanup_vanished = cleanup;
        self
    }

    pub fn sync_reenabled_policy(mut self, policy: ReenabledPolicy) -> Self {
        self.config.sync.reenabled_policy = policy;
        self
    }

    pub fn sync_heartbeat_file(mut self, path: PathBuf) -> Self {
        self.config.sync.heartbeat_file = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_file(mut self, file: PathBuf) -> Self {
        self.config.logging.file = Some(file);
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
