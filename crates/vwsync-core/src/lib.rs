//! vwsync Core - Domain logic and reconciliation engine
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `ManagedAccount`, `RemoteAccount`, `LedgerState`
//! - **Reconciliation engine** - pure drift detection and change planning
//! - **Port definitions** - Traits for adapters: `IEmailSource`, `IRemoteDirectory`, `ILedger`
//! - **Configuration** - YAML config with environment overrides
//!
//! # Architecture
//!
//! The domain and reconcile modules contain pure logic with no I/O.
//! Ports define trait interfaces that adapter crates implement, and the
//! driver crate (`vwsync-sync`) applies the engine's output through them.

pub mod config;
pub mod domain;
pub mod ports;
pub mod reconcile;
