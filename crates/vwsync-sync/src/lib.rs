//! vwsync Sync - Reconciliation driver
//!
//! Provides:
//! - One reconciliation pass: fetch snapshots, run the engine, correct the
//!   ledger, apply the change plan
//! - The interval loop with cooperative shutdown and a heartbeat file
//!
//! ## Modules
//!
//! - [`reconciler`] - Applies a single pass through the ports
//! - [`runner`] - Runs passes until cancelled
//! - [`heartbeat`] - Liveness file touched after each successful pass

pub mod heartbeat;
pub mod reconciler;
pub mod runner;

pub use heartbeat::Heartbeat;
pub use reconciler::{PassMode, PassReport, Reconciler, ReconcilerOptions};
pub use runner::{LoopOutcome, PassLoop};
