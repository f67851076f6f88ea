//! Retention & ordering for persisted ledgers.
//!
//! The notified ledger would otherwise grow forever; entries older than the
//! rolling window are dropped before it is written back. Survivors are kept
//! newest-first so persisted files and heuristic scans are deterministic.

use chrono::{Duration, Months, NaiveDateTime, Utc};

use crate::quake::QuakeRecord;

pub const DEFAULT_RETENTION_MONTHS: u32 = 2;

/// Current local civil time at a fixed UTC offset (PHT is +8).
pub fn civil_now(utc_offset_hours: i32) -> NaiveDateTime {
    Utc::now().naive_utc() + Duration::hours(utc_offset_hours as i64)
}

/// Sort newest first. Stable, so equal timestamps keep their input order;
/// records whose timestamp doesn't parse go last.
pub fn newest_first<'a, I>(records: I) -> Vec<&'a QuakeRecord>
where
    I: IntoIterator<Item = &'a QuakeRecord>,
{
    let mut keyed: Vec<_> = records
        .into_iter()
        .map(|q| (q.parsed_timestamp(), q))
        .collect();
    // Option orders None < Some, so reversing puts None last
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, q)| q).collect()
}

/// Drop entries older than `months` before `now` (and entries whose
/// timestamp can't be read), returning the rest newest-first.
pub fn prune_and_order<I>(records: I, now: NaiveDateTime, months: u32) -> Vec<QuakeRecord>
where
    I: IntoIterator<Item = QuakeRecord>,
{
    let cutoff = now.checked_sub_months(Months::new(months)).unwrap_or(now);

    let mut kept: Vec<(NaiveDateTime, QuakeRecord)> = Vec::new();
    for q in records {
        let Some(t) = q.parsed_timestamp() else {
            tracing::warn!(target: "retention", datetime = %q.timestamp, "dropping entry with unparseable datetime");
            continue;
        };
        if t < cutoff {
            continue;
        }
        kept.push((t, q));
    }

    kept.sort_by(|a, b| b.0.cmp(&a.0));
    kept.into_iter().map(|(_, q)| q).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quake::{format_timestamp, parse_timestamp};

    fn at(ts: &str, loc: &str) -> QuakeRecord {
        QuakeRecord::new(ts, "11.0", "124.0", "10", "4.5", loc, "")
    }

    #[test]
    fn prunes_old_entries_regardless_of_order() {
        let now = parse_timestamp("15 October 2025 - 12:00:00 PM").unwrap();
        let recent = at("10 October 2025 - 08:00:00 AM", "recent");
        let edge = at("15 August 2025 - 12:00:00 PM", "edge");
        let old = at("14 August 2025 - 11:59:59 AM", "old");
        let newest = at("15 October 2025 - 11:00:00 AM", "newest");

        for input in [
            vec![old.clone(), recent.clone(), edge.clone(), newest.clone()],
            vec![newest.clone(), edge.clone(), recent.clone(), old.clone()],
        ] {
            let out = prune_and_order(input, now, 2);
            let locs: Vec<_> = out.iter().map(|q| q.location.as_str()).collect();
            assert_eq!(locs, vec!["newest", "recent", "edge"]);
        }
    }

    #[test]
    fn unparseable_entries_are_dropped() {
        let now = parse_timestamp("15 October 2025 - 12:00:00 PM").unwrap();
        let out = prune_and_order(vec![at("yesterday", "x")], now, 2);
        assert!(out.is_empty());
    }

    #[test]
    fn civil_now_is_offset_from_utc() {
        let utc = Utc::now().naive_utc();
        let pht = civil_now(8);
        let diff = (pht - utc).num_minutes();
        assert!((479..=481).contains(&diff), "got {diff}");
        // round trips through the record layout
        assert!(parse_timestamp(&format_timestamp(&pht)).is_some());
    }
}
