//! # Identity Resolver
//! Decides whether a freshly scraped record is an event we already saw in the
//! previous poll.
//!
//! PHIVOLCS publishes no stable event id. Between bulletins the same quake can
//! get a different timestamp (seconds jitter or a re-picked origin time), a
//! reworded location and a higher bulletin number. Resolution order:
//!
//! 1. exact coarse key (`timestamp|origin`) in the last-poll ledger;
//! 2. for follow-up bulletins only (sequence > 1):
//!    a. same minute, same origin, lower sequence;
//!    b. within the time window, origin similarity above threshold, lower
//!       sequence.
//!
//! Heuristic scans walk the ledger newest-first and take the first acceptable
//! candidate, not the best-scoring one.

use serde::Deserialize;

use crate::ledger::Ledger;
use crate::quake::QuakeRecord;
use crate::similarity::address_similarity;
use crate::temporal::{same_minute, within_minutes, DEFAULT_WINDOW_MINUTES};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverParams {
    /// Minimum origin similarity (percent) for the fuzzy fallback.
    pub similarity_threshold: f64,
    /// Time window (minutes) for the fuzzy fallback.
    pub window_minutes: i64,
}

impl Default for ResolverParams {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            window_minutes: DEFAULT_WINDOW_MINUTES,
        }
    }
}

/// How (and whether) a record was tied to a previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// Coarse key present in the last poll.
    Exact(&'a QuakeRecord),
    /// Same minute and origin, earlier bulletin.
    Revision(&'a QuakeRecord),
    /// Similar origin within the time window, earlier bulletin.
    Similar { previous: &'a QuakeRecord, score: f64 },
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn previous(&self) -> Option<&'a QuakeRecord> {
        match *self {
            Resolution::Exact(p) | Resolution::Revision(p) => Some(p),
            Resolution::Similar { previous, .. } => Some(previous),
            Resolution::Unresolved => None,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Resolution::Exact(_) => "exact",
            Resolution::Revision(_) => "revision",
            Resolution::Similar { .. } => "similar",
            Resolution::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    params: ResolverParams,
}

impl IdentityResolver {
    pub fn new(params: ResolverParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ResolverParams {
        &self.params
    }

    pub fn resolve<'a>(&self, current: &QuakeRecord, last_poll: &'a Ledger) -> Resolution<'a> {
        if let Some(prev) = last_poll.lookup(current) {
            return Resolution::Exact(prev);
        }

        // Without a follow-up bulletin number there is nothing to anchor a
        // heuristic match on.
        let Some(seq) = current.bulletin_number().filter(|&n| n > 1) else {
            return Resolution::Unresolved;
        };

        let candidates = last_poll.newest_first();

        if let Some(prev) = candidates
            .iter()
            .copied()
            .find(|past| is_revision_of(current, seq, past))
        {
            return Resolution::Revision(prev);
        }

        for past in candidates {
            if !within_minutes(&past.timestamp, &current.timestamp, self.params.window_minutes) {
                continue;
            }
            let score = address_similarity(&current.origin, &past.origin);
            if score < self.params.similarity_threshold {
                continue;
            }
            // a candidate without a bulletin number counts as the first one
            if past.bulletin_number().unwrap_or(0) < seq {
                return Resolution::Similar {
                    previous: past,
                    score,
                };
            }
        }

        Resolution::Unresolved
    }
}

/// Same minute, same origin, strictly earlier bulletin.
fn is_revision_of(current: &QuakeRecord, current_seq: u32, past: &QuakeRecord) -> bool {
    let Some(past_seq) = past.bulletin_number() else {
        return false;
    };
    past_seq < current_seq
        && past.origin == current.origin
        && same_minute(&current.timestamp, &past.timestamp)
}
