//! Liveness file for container health checks
//!
//! The file's modification time is what health checks look at; its content is the
//! time of the last successful pass.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

#[derive(Debug, Clone)]
pub struct Heartbeat {
    path: PathBuf,
}

impl Heartbeat {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the file, creating it if needed
    pub async fn touch(&self) -> Result<()> {
        tokio::fs::write(&self.path, format!("{}\n", Utc::now().to_rfc3339()))
            .await
            .with_context(|| format!("Failed to touch heartbeat file {}", self.path.display()))
    }
}
