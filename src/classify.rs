//! # Classification Engine
//! Pure, testable per-cycle logic: `(scraped batch, last poll, notified)` →
//! labels plus the ledger snapshots to persist. No I/O.
//!
//! Policy:
//! - unresolved records are New when significant and not yet notified;
//! - resolved records are Revised when something changed, that exact bulletin
//!   wasn't announced yet, and either snapshot is significant (a downgrade
//!   below threshold is still reported once as a correction);
//! - everything else is ignored as a duplicate or as insignificant.

use chrono::NaiveDateTime;
use std::collections::HashSet;

use crate::diff::{changed, changed_fields};
use crate::geo::GeoThresholdPolicy;
use crate::ledger::Ledger;
use crate::notify::QuakeAlert;
use crate::quake::QuakeRecord;
use crate::resolver::{IdentityResolver, Resolution};
use crate::retention::{prune_and_order, DEFAULT_RETENTION_MONTHS};
use crate::temporal::same_minute;

/// Why a record produced no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Unresolved, but its fine key is already in the notified ledger.
    AlreadyNotified,
    /// Resolved and no tracked field changed.
    Unchanged,
    /// Changed, but this exact bulletin was already announced.
    BulletinAlreadyAnnounced,
    /// Neither snapshot clears its geo threshold.
    BelowThreshold,
}

/// Coarse outcome buckets used in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    New,
    Revised,
    Duplicate,
    Insignificant,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::New => "new",
            Label::Revised => "revised",
            Label::Duplicate => "duplicate",
            Label::Insignificant => "insignificant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    New(QuakeRecord),
    Revised {
        current: QuakeRecord,
        previous: QuakeRecord,
    },
    Ignored {
        record: QuakeRecord,
        reason: IgnoreReason,
    },
}

impl Classification {
    pub fn label(&self) -> Label {
        match self {
            Classification::New(_) => Label::New,
            Classification::Revised { .. } => Label::Revised,
            Classification::Ignored {
                reason: IgnoreReason::BelowThreshold,
                ..
            } => Label::Insignificant,
            Classification::Ignored { .. } => Label::Duplicate,
        }
    }

    pub fn record(&self) -> &QuakeRecord {
        match self {
            Classification::New(r) => r,
            Classification::Revised { current, .. } => current,
            Classification::Ignored { record, .. } => record,
        }
    }
}

/// Everything one cycle produces.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// One entry per scraped record, in scrape order.
    pub classifications: Vec<Classification>,
    /// Replaces the last-poll ledger: always the raw scraped batch.
    pub last_poll: Vec<QuakeRecord>,
    /// Replaces the notified ledger; `None` when nothing new was announced.
    pub notified: Option<Vec<QuakeRecord>>,
}

impl CycleOutcome {
    /// Alerts in dispatch order: new quakes first, then revisions, each
    /// oldest first (the source table lists newest first).
    pub fn alerts(&self) -> Vec<QuakeAlert> {
        let news = self.classifications.iter().rev().filter_map(|c| match c {
            Classification::New(r) => Some(QuakeAlert::new_quake(r.clone())),
            _ => None,
        });
        let revisions = self.classifications.iter().rev().filter_map(|c| match c {
            Classification::Revised { current, previous } => {
                Some(QuakeAlert::revision(current.clone(), previous.clone()))
            }
            _ => None,
        });
        news.chain(revisions).collect()
    }

    pub fn count(&self, label: Label) -> usize {
        self.classifications
            .iter()
            .filter(|c| c.label() == label)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    policy: GeoThresholdPolicy,
    resolver: IdentityResolver,
    retention_months: u32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            GeoThresholdPolicy::default(),
            IdentityResolver::default(),
            DEFAULT_RETENTION_MONTHS,
        )
    }
}

impl Classifier {
    pub fn new(policy: GeoThresholdPolicy, resolver: IdentityResolver, retention_months: u32) -> Self {
        Self {
            policy,
            resolver,
            retention_months,
        }
    }

    pub fn policy(&self) -> &GeoThresholdPolicy {
        &self.policy
    }

    /// Classify a single scraped record.
    pub fn classify(
        &self,
        current: &QuakeRecord,
        last_poll: &Ledger,
        notified: &Ledger,
    ) -> Classification {
        let resolution = self.resolver.resolve(current, last_poll);

        let Some(previous) = resolution.previous() else {
            return self.classify_unseen(current, notified);
        };

        if !changed(previous, current) {
            return ignored(current, IgnoreReason::Unchanged);
        }

        if bulletin_already_announced(current, notified) {
            return ignored(current, IgnoreReason::BulletinAlreadyAnnounced);
        }

        if !(self.policy.is_significant(current) || self.policy.is_significant(previous)) {
            return ignored(current, IgnoreReason::BelowThreshold);
        }

        tracing::info!(
            target: "classify",
            datetime = %current.timestamp,
            previous = %previous.timestamp,
            method = resolution.method(),
            fields = ?changed_fields(previous, current),
            "revised quake"
        );
        if let Resolution::Similar { score, .. } = resolution {
            tracing::debug!(target: "classify", score, "matched through origin similarity");
        }

        Classification::Revised {
            current: current.clone(),
            previous: previous.clone(),
        }
    }

    fn classify_unseen(&self, current: &QuakeRecord, notified: &Ledger) -> Classification {
        if notified.contains(current) {
            return ignored(current, IgnoreReason::AlreadyNotified);
        }
        if !self.policy.is_significant(current) {
            return ignored(current, IgnoreReason::BelowThreshold);
        }
        tracing::info!(
            target: "classify",
            datetime = %current.timestamp,
            magnitude = %current.magnitude,
            location = %current.location,
            "new quake"
        );
        Classification::New(current.clone())
    }

    /// Run a whole cycle. `now` is local civil time, used for retention.
    pub fn classify_cycle(
        &self,
        scraped: Vec<QuakeRecord>,
        last_poll: &Ledger,
        notified: &Ledger,
        now: NaiveDateTime,
    ) -> CycleOutcome {
        let classifications: Vec<Classification> = scraped
            .iter()
            .map(|q| self.classify(q, last_poll, notified))
            .collect();

        for c in &classifications {
            if let Classification::Ignored { record, reason } = c {
                tracing::debug!(
                    target: "classify",
                    datetime = %record.timestamp,
                    origin = %record.origin,
                    ?reason,
                    "ignored"
                );
            }
        }

        let announced: Vec<QuakeRecord> = classifications
            .iter()
            .filter(|c| matches!(c.label(), Label::New | Label::Revised))
            .map(|c| c.record().clone())
            .collect();

        let notified = if announced.is_empty() {
            None
        } else {
            // an announcement supersedes any older entry under the same fine key
            let announced_keys: HashSet<String> = announced.iter().map(|q| q.fine_key()).collect();
            let retained = prune_and_order(
                notified
                    .iter()
                    .filter(|q| !announced_keys.contains(&q.fine_key()))
                    .cloned(),
                now,
                self.retention_months,
            );
            Some(announced.into_iter().chain(retained).collect())
        };

        CycleOutcome {
            classifications,
            last_poll: scraped,
            notified,
        }
    }
}

fn ignored(record: &QuakeRecord, reason: IgnoreReason) -> Classification {
    Classification::Ignored {
        record: record.clone(),
        reason,
    }
}

/// Any notified entry in the same minute carrying the exact same bulletin.
/// Records without a bulletin can't be matched this way.
fn bulletin_already_announced(current: &QuakeRecord, notified: &Ledger) -> bool {
    if current.bulletin_reference.is_empty() {
        return false;
    }
    notified.iter().any(|posted| {
        posted.bulletin_reference == current.bulletin_reference
            && same_minute(&current.timestamp, &posted.timestamp)
    })
}
