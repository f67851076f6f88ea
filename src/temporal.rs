//! Tolerant timestamp matching.
//!
//! Upstream jitters seconds between bulletins and occasionally moves the
//! event time itself by a minute or two, so identity checks compare at
//! minute granularity with an optional window. Unparseable input never
//! matches: merging two distinct events is worse than missing a revision.

use crate::quake::parse_timestamp;

/// Tolerance used by the similarity-based fallback scan.
pub const DEFAULT_WINDOW_MINUTES: i64 = 3;

/// True iff both timestamps parse and their absolute difference, truncated
/// to whole minutes, is at most `tolerance_minutes`.
pub fn within_minutes(a: &str, b: &str, tolerance_minutes: i64) -> bool {
    let (Some(ta), Some(tb)) = (parse_timestamp(a), parse_timestamp(b)) else {
        return false;
    };
    (ta - tb).abs().num_minutes() <= tolerance_minutes
}

/// Same event minute (seconds jitter ignored).
pub fn same_minute(a: &str, b: &str) -> bool {
    within_minutes(a, b, 0)
}
