// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod quake;

// Identity resolution & classification engine
pub mod classify;
pub mod diff;
pub mod geo;
pub mod ledger;
pub mod resolver;
pub mod retention;
pub mod similarity;
pub mod temporal;

// Collaborators: scraping, persistence, notifications, orchestration
pub mod ingest;
pub mod telemetry;
pub mod monitor;
pub mod notify;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::classify::{Classification, Classifier, CycleOutcome, IgnoreReason, Label};
pub use crate::config::MonitorConfig;
pub use crate::ledger::Ledger;
pub use crate::monitor::{CycleReport, Monitor};
pub use crate::notify::{Notifier, NotifierMux, QuakeAlert};
pub use crate::quake::{KeyKind, QuakeRecord};
