//! Field-wise change detection between two snapshots of the same event.
//!
//! Comparison is on source text, so a reformatted value ("4.0" vs "4")
//! counts as a change. It only gates whether a revision is examined further.

use crate::quake::QuakeRecord;

/// Tracked fields that differ between `a` and `b`, by name.
pub fn changed_fields(a: &QuakeRecord, b: &QuakeRecord) -> Vec<&'static str> {
    let pairs: [(&'static str, &str, &str); 6] = [
        ("magnitude", a.magnitude.as_str(), b.magnitude.as_str()),
        ("depth", a.depth.as_str(), b.depth.as_str()),
        ("location", a.location.as_str(), b.location.as_str()),
        ("latitude", a.latitude.as_str(), b.latitude.as_str()),
        ("longitude", a.longitude.as_str(), b.longitude.as_str()),
        ("bulletin", a.bulletin_reference.as_str(), b.bulletin_reference.as_str()),
    ];
    pairs
        .into_iter()
        .filter(|(_, x, y)| x != y)
        .map(|(name, _, _)| name)
        .collect()
}

pub fn changed(a: &QuakeRecord, b: &QuakeRecord) -> bool {
    a.magnitude != b.magnitude
        || a.depth != b.depth
        || a.location != b.location
        || a.latitude != b.latitude
        || a.longitude != b.longitude
        || a.bulletin_reference != b.bulletin_reference
}
