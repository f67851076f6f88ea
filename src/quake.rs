//! # Quake Records
//! One observed seismic event snapshot as scraped from the PHIVOLCS table,
//! plus the identity keys and lazily parsed views the engine works with.
//!
//! Fields stay as source text so formatting changes between bulletins are
//! visible to the record diff; numeric views are parsed on demand.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Internal datetime layout used in records and ledger files,
/// e.g. `30 September 2025 - 09:48:54 PM`.
pub const DATE_TIME_LAYOUT: &str = "%d %B %Y - %I:%M:%S %p";

static RE_BULLETIN_NO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_B(\d+)F?\.html$").expect("bulletin number regex"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuakeRecord {
    /// Local civil time, second precision (see [`DATE_TIME_LAYOUT`]).
    #[serde(rename = "datetime")]
    pub timestamp: String,
    pub latitude: String,
    pub longitude: String,
    /// Kilometres.
    pub depth: String,
    pub magnitude: String,
    /// Full location including the relative-direction qualifier.
    pub location: String,
    /// `location` without the qualifier, e.g. `Carmen (Cebu)`.
    pub origin: String,
    /// Bulletin URL; empty when the row carried no link.
    #[serde(rename = "bulletin", default)]
    pub bulletin_reference: String,
}

impl QuakeRecord {
    /// Build a record, deriving `origin` from `location`.
    pub fn new(
        timestamp: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        depth: impl Into<String>,
        magnitude: impl Into<String>,
        location: impl Into<String>,
        bulletin_reference: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            timestamp: timestamp.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            depth: depth.into(),
            magnitude: magnitude.into(),
            origin: extract_origin(&location),
            location,
            bulletin_reference: bulletin_reference.into(),
        }
    }

    /// `timestamp|origin`: same-event continuity across polls.
    pub fn coarse_key(&self) -> String {
        format!("{}|{}", self.timestamp, self.origin)
    }

    /// `timestamp|location`: exact-notification duplication.
    pub fn fine_key(&self) -> String {
        format!("{}|{}", self.timestamp, self.location)
    }

    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    pub fn magnitude_value(&self) -> Option<f64> {
        self.magnitude.trim().parse::<f64>().ok()
    }

    /// `(lat, lon)` when both parse as finite numbers.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.trim().parse::<f64>().ok()?;
        let lon = self.longitude.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
    }

    /// Revision counter from the bulletin URL (`..._B3F.html` → 3).
    pub fn bulletin_number(&self) -> Option<u32> {
        bulletin_number(&self.bulletin_reference)
    }
}

/// Which identity key a ledger is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// `timestamp|origin`
    Coarse,
    /// `timestamp|location`
    Fine,
}

impl KeyKind {
    pub fn key_for(self, q: &QuakeRecord) -> String {
        match self {
            KeyKind::Coarse => q.coarse_key(),
            KeyKind::Fine => q.fine_key(),
        }
    }
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), DATE_TIME_LAYOUT).ok()
}

pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(DATE_TIME_LAYOUT).to_string()
}

/// Strip the relative-direction qualifier: everything up to and including
/// the first `"of "`. Returns the input unchanged when there is no marker.
pub fn extract_origin(location: &str) -> String {
    match location.find("of ") {
        Some(start) => location[start + 3..].trim().to_string(),
        None => location.to_string(),
    }
}

pub fn bulletin_number(url: &str) -> Option<u32> {
    RE_BULLETIN_NO
        .captures(url.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
