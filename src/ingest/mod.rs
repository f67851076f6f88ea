// src/ingest/mod.rs
pub mod providers;
pub mod types;

use chrono::{Duration, NaiveDate, NaiveTime};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

use crate::quake::{format_timestamp, parse_timestamp};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("quake_scraped_total", "Rows parsed from the source table.");
        describe_counter!("quake_fetch_errors_total", "Source fetch/parse errors.");
        describe_counter!(
            "quake_classified_total",
            "Scraped records by classification label."
        );
        describe_counter!("quake_notify_errors_total", "Failed notification deliveries.");
        describe_histogram!("quake_parse_ms", "Table parse time in milliseconds.");
        describe_histogram!("quake_cycle_ms", "Full poll cycle time in milliseconds.");
        describe_gauge!(
            "quake_cycle_last_run_ts",
            "Unix ts when the last poll cycle finished."
        );
    });
}

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_TABLE_HM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" - \d{1,2}:\d{2} [AP]M$").expect("table time regex"));
static RE_BULLETIN_TS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})_(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})").expect("bulletin ts regex"));

/// Collapse whitespace runs (incl. NBSP and newlines) and trim.
pub fn normalize_cell(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// Table datetimes only carry minutes (`30 September 2025 - 9:48 PM`);
/// add `:00` seconds and re-render in the canonical layout.
pub fn normalize_table_datetime(raw: &str) -> String {
    let mut s = normalize_cell(raw);
    if RE_TABLE_HM.is_match(&s) {
        s = s.replacen(" AM", ":00 AM", 1).replacen(" PM", ":00 PM", 1);
    }
    match parse_timestamp(&s) {
        Some(t) => format_timestamp(&t),
        None => s,
    }
}

/// Bulletin URLs embed the UTC origin time with seconds, e.g.
/// `.../2025_0930_134854_B1.html`. Returns it shifted to local civil time.
pub fn datetime_from_bulletin(url: &str, utc_offset_hours: i32) -> Option<String> {
    let c = RE_BULLETIN_TS.captures(url)?;
    let num = |i: usize| c.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let date = NaiveDate::from_ymd_opt(num(1)? as i32, num(2)?, num(3)?)?;
    let time = NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6)?)?;
    let local = date.and_time(time) + Duration::hours(utc_offset_hours as i64);
    Some(format_timestamp(&local))
}

pub(crate) fn record_fetch_error(source: &str, e: &anyhow::Error) {
    counter!("quake_fetch_errors_total").increment(1);
    tracing::warn!(target: "ingest", source, error = %format!("{e:#}"), "source error");
}
