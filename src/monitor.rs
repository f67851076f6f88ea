//! Poll-cycle orchestration: fetch → resolve/classify → notify → persist.
//!
//! One cycle runs to completion before the next begins. The ledgers are read
//! at the start of a cycle and rewritten at the end; nothing else survives
//! between cycles.

use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

use crate::classify::{Classifier, Label};
use crate::config::MonitorConfig;
use crate::ingest::providers::phivolcs::PhivolcsProvider;
use crate::ingest::types::QuakeSource;
use crate::ingest::{ensure_metrics_described, record_fetch_error};
use crate::notify::NotifierMux;
use crate::quake::KeyKind;
use crate::resolver::IdentityResolver;
use crate::retention::civil_now;
use crate::store::LedgerStore;

/// Counts from one finished cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub scraped: usize,
    pub new: usize,
    pub revised: usize,
    pub duplicate: usize,
    pub insignificant: usize,
    pub notify_failures: usize,
}

pub struct Monitor {
    source: Box<dyn QuakeSource>,
    notifier: NotifierMux,
    classifier: Classifier,
    last_poll: LedgerStore,
    notified: LedgerStore,
    utc_offset_hours: i32,
    poll_interval: Duration,
    error_interval: Duration,
}

impl Monitor {
    pub fn new(source: Box<dyn QuakeSource>, notifier: NotifierMux, cfg: &MonitorConfig) -> Self {
        Self {
            source,
            notifier,
            classifier: Classifier::new(
                cfg.geo,
                IdentityResolver::new(cfg.resolver),
                cfg.retention_months,
            ),
            last_poll: LedgerStore::new(cfg.last_poll_path()),
            notified: LedgerStore::new(cfg.notified_path()),
            utc_offset_hours: cfg.source.utc_offset_hours,
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            error_interval: Duration::from_secs(cfg.error_interval_secs),
        }
    }

    /// PHIVOLCS over HTTP plus the notifiers named by the config.
    pub fn from_config(cfg: &MonitorConfig) -> Result<Self> {
        let source = PhivolcsProvider::from_config(&cfg.source)?;
        Ok(Self::new(
            Box::new(source),
            NotifierMux::from_config(&cfg.notify),
            cfg,
        ))
    }

    pub async fn run_cycle(&self) -> Result<CycleReport> {
        ensure_metrics_described();
        let t0 = Instant::now();

        let scraped = match self.source.fetch_latest().await {
            Ok(v) => v,
            Err(e) => {
                record_fetch_error(self.source.name(), &e);
                return Err(e);
            }
        };

        let last_poll = self.last_poll.load(KeyKind::Coarse);
        let notified = self.notified.load(KeyKind::Fine);
        let now = civil_now(self.utc_offset_hours);

        let outcome = self
            .classifier
            .classify_cycle(scraped, &last_poll, &notified, now);

        let mut report = CycleReport {
            scraped: outcome.last_poll.len(),
            new: outcome.count(Label::New),
            revised: outcome.count(Label::Revised),
            duplicate: outcome.count(Label::Duplicate),
            insignificant: outcome.count(Label::Insignificant),
            notify_failures: 0,
        };
        for label in [Label::New, Label::Revised, Label::Duplicate, Label::Insignificant] {
            counter!("quake_classified_total", "label" => label.as_str())
                .increment(outcome.count(label) as u64);
        }

        let alerts = outcome.alerts();
        if alerts.is_empty() {
            tracing::info!(target: "monitor", "no new or updated earthquakes detected");
        }
        for alert in &alerts {
            report.notify_failures += self.notifier.notify(alert).await;
        }

        if let Some(records) = &outcome.notified {
            self.notified.save(records);
        }
        self.last_poll.save(&outcome.last_poll);

        histogram!("quake_cycle_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        gauge!("quake_cycle_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        tracing::info!(
            target: "monitor",
            scraped = report.scraped,
            new = report.new,
            revised = report.revised,
            duplicate = report.duplicate,
            insignificant = report.insignificant,
            notify_failures = report.notify_failures,
            "cycle done"
        );
        Ok(report)
    }

    /// Poll until Ctrl-C. Failed cycles retry after the shorter error interval.
    pub async fn run_until_shutdown(&self) {
        loop {
            let pause = match self.run_cycle().await {
                Ok(_) => self.poll_interval,
                Err(e) => {
                    tracing::warn!(target: "monitor", error = %format!("{e:#}"), "cycle skipped");
                    self.error_interval
                }
            };
            tracing::info!(target: "monitor", secs = pause.as_secs(), "sleeping before next poll");
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(target: "monitor", "shutdown requested");
                    return;
                }
            }
        }
    }
}
