//! Outbound notifications for new and revised quakes.
//!
//! Delivery backends implement [`Notifier`]; [`NotifierMux`] fans one alert
//! out to every configured backend and only logs failures, so a broken chat
//! backend never stops a poll cycle.

pub mod format;
pub mod matrix;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;

use crate::config::NotifyConfig;
use crate::quake::QuakeRecord;

pub use matrix::MatrixNotifier;

/// One message worth sending. For new quakes `previous` is the record itself.
#[derive(Debug, Clone, PartialEq)]
pub struct QuakeAlert {
    pub current: QuakeRecord,
    pub previous: QuakeRecord,
    pub is_revision: bool,
}

impl QuakeAlert {
    pub fn new_quake(q: QuakeRecord) -> Self {
        Self {
            previous: q.clone(),
            current: q,
            is_revision: false,
        }
    }

    pub fn revision(current: QuakeRecord, previous: QuakeRecord) -> Self {
        Self {
            current,
            previous,
            is_revision: true,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &QuakeAlert) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Logs what would have been posted. Used when no chat backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, alert: &QuakeAlert) -> Result<()> {
        let msg = format::render(alert);
        tracing::info!(target: "notify", revision = alert.is_revision, "would post:\n{}", msg.plain);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

pub struct NotifierMux {
    sinks: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new(sinks: Vec<Box<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    /// Matrix when any Matrix setting is present (missing pieces then fail
    /// per send), otherwise the log-only notifier.
    pub fn from_config(cfg: &NotifyConfig) -> Self {
        let mut sinks: Vec<Box<dyn Notifier>> = Vec::new();
        if cfg.dry_run {
            tracing::info!(target: "notify", "dry run, alerts are only logged");
            sinks.push(Box::new(LogNotifier));
        } else if cfg.matrix.any_set() {
            sinks.push(Box::new(MatrixNotifier::from_config(&cfg.matrix)));
        } else {
            tracing::warn!(target: "notify", "Matrix not configured, alerts are only logged");
            sinks.push(Box::new(LogNotifier));
        }
        Self { sinks }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Send to every sink. Returns the number of failed deliveries.
    pub async fn notify(&self, alert: &QuakeAlert) -> usize {
        let mut failures = 0;
        for sink in &self.sinks {
            if let Err(e) = sink.send(alert).await {
                failures += 1;
                counter!("quake_notify_errors_total").increment(1);
                tracing::warn!(target: "notify", sink = sink.name(), error = %format!("{e:#}"), "post failed");
            }
        }
        failures
    }
}
