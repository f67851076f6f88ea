// src/config/monitor.rs
//! Monitor configuration: built-in defaults, then an optional TOML file,
//! then environment variables (highest precedence).
//!
//! Invalid numeric env values are logged and ignored rather than failing
//! startup. Only an explicitly named config file that can't be read or
//! parsed is fatal.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::geo::GeoThresholdPolicy;
use crate::resolver::ResolverParams;
use crate::retention::DEFAULT_RETENTION_MONTHS;

pub const ENV_CONFIG_PATH: &str = "QUAKE_MONITOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/quake_monitor.toml";

pub const DEFAULT_BASE_URL: &str = "https://earthquake.phivolcs.dost.gov.ph";
pub const DEFAULT_ROW_SELECTOR: &str = "body > div > table:nth-child(4) > tbody > tr";
pub const DEFAULT_MAX_ROWS: usize = 500;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Maximum table rows parsed per poll.
    pub parse_limit: usize,
    pub row_selector: String,
    /// The upstream certificate chain is often incomplete.
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
    /// Offset of local civil time from UTC (PHT = +8).
    pub utc_offset_hours: i32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            parse_limit: DEFAULT_MAX_ROWS,
            row_selector: DEFAULT_ROW_SELECTOR.to_string(),
            accept_invalid_certs: true,
            timeout_secs: 30,
            utc_offset_hours: 8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    pub base_url: Option<String>,
    pub room_id: Option<String>,
    pub access_token: Option<String>,
}

impl MatrixConfig {
    pub fn any_set(&self) -> bool {
        [&self.base_url, &self.room_id, &self.access_token]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Log alerts instead of posting them.
    pub dry_run: bool,
    pub matrix: MatrixConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub source: SourceConfig,
    pub geo: GeoThresholdPolicy,
    pub resolver: ResolverParams,
    pub retention_months: u32,
    pub poll_interval_secs: u64,
    /// Sleep after a failed fetch/parse.
    pub error_interval_secs: u64,
    /// Directory holding the ledger files.
    pub state_dir: PathBuf,
    pub notify: NotifyConfig,
    /// `host:port` for the Prometheus exporter; disabled when unset.
    pub metrics_addr: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            geo: GeoThresholdPolicy::default(),
            resolver: ResolverParams::default(),
            retention_months: DEFAULT_RETENTION_MONTHS,
            poll_interval_secs: 150,
            error_interval_secs: 30,
            state_dir: PathBuf::from("."),
            notify: NotifyConfig::default(),
            metrics_addr: None,
        }
    }
}

impl MonitorConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Defaults → `$QUAKE_MONITOR_CONFIG` (must exist) or
    /// `config/quake_monitor.toml` (if present) → process environment.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Override fields from an env-style lookup.
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        set_positive(&get, "PARSE_LIMIT", &mut self.source.parse_limit);
        set_positive(&get, "REF_RADIUS_KM", &mut self.geo.radius_km);
        set_positive(&get, "LOCAL_MAG_THRESH", &mut self.geo.local_threshold);
        set_positive(&get, "GLOBAL_MAG_THRESH", &mut self.geo.global_threshold);
        set_positive(&get, "SIMILAR_ORIGIN_THRESH", &mut self.resolver.similarity_threshold);
        set_positive(&get, "SIMILAR_TIME_DELTA_MIN", &mut self.resolver.window_minutes);
        set_positive(&get, "POLL_INTERVAL_SECS", &mut self.poll_interval_secs);
        set_positive(&get, "ERROR_INTERVAL_SECS", &mut self.error_interval_secs);
        set_positive(&get, "RETENTION_MONTHS", &mut self.retention_months);
        set_positive(&get, "FETCH_TIMEOUT_SECS", &mut self.source.timeout_secs);

        set_coordinate(&get, "REF_POINT_LAT", 90.0, &mut self.geo.ref_lat);
        set_coordinate(&get, "REF_POINT_LON", 180.0, &mut self.geo.ref_lon);

        if let Some(v) = get("UTC_OFFSET_HOURS") {
            match v.parse::<i32>() {
                Ok(h) if (-12..=14).contains(&h) => self.source.utc_offset_hours = h,
                _ => warn_invalid("UTC_OFFSET_HOURS", &v),
            }
        }

        if let Some(v) = get("PHIVOLCS_BASE_URL") {
            self.source.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("PHIVOLCS_ACCEPT_INVALID_CERTS") {
            self.source.accept_invalid_certs = parse_flag(&v);
        }
        if let Some(v) = get("STATE_DIR") {
            self.state_dir = PathBuf::from(v);
        }
        if let Some(v) = get("NOTIFY_DRY_RUN") {
            self.notify.dry_run = parse_flag(&v);
        }
        if let Some(v) = get("METRICS_ADDR") {
            self.metrics_addr = Some(v);
        }
        if let Some(v) = get("MATRIX_BASE_URL") {
            self.notify.matrix.base_url = Some(v);
        }
        if let Some(v) = get("MATRIX_ROOM_ID") {
            self.notify.matrix.room_id = Some(v);
        }
        if let Some(v) = get("MATRIX_ACCESS_TOKEN") {
            self.notify.matrix.access_token = Some(v);
        }
    }

    pub fn last_poll_path(&self) -> PathBuf {
        self.state_dir.join("last_quakes.json")
    }

    pub fn notified_path(&self) -> PathBuf {
        self.state_dir.join("posted_quakes.json")
    }
}

fn warn_invalid(name: &str, raw: &str) {
    tracing::warn!(target: "config", var = name, value = raw, "invalid value, keeping default");
}

fn parse_flag(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

trait Positive: std::str::FromStr + PartialOrd + Default + Copy {}
impl Positive for usize {}
impl Positive for u32 {}
impl Positive for u64 {}
impl Positive for i64 {}
impl Positive for f64 {}

fn set_positive<T, G>(get: &G, name: &str, slot: &mut T)
where
    T: Positive,
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else { return };
    match raw.parse::<T>() {
        // NaN fails the comparison too
        Ok(v) if v > T::default() => *slot = v,
        _ => warn_invalid(name, &raw),
    }
}

fn set_coordinate<G>(get: &G, name: &str, bound: f64, slot: &mut f64)
where
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(name) else { return };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= bound => *slot = v,
        _ => warn_invalid(name, &raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = MonitorConfig::default();
        assert_eq!(c.source.parse_limit, 500);
        assert_eq!(c.geo.local_threshold, 4.0);
        assert_eq!(c.geo.global_threshold, 4.5);
        assert_eq!(c.resolver.similarity_threshold, 60.0);
        assert_eq!(c.resolver.window_minutes, 3);
        assert_eq!(c.poll_interval_secs, 150);
        assert_eq!(c.error_interval_secs, 30);
        assert_eq!(c.retention_months, 2);
        assert!(!c.notify.matrix.any_set());
    }

    #[test]
    fn env_overrides_and_rejects_invalid() {
        let vars = env(&[
            ("PARSE_LIMIT", "50"),
            ("REF_POINT_LAT", "14.6"),
            ("REF_POINT_LON", "-500"),
            ("REF_RADIUS_KM", "-3"),
            ("GLOBAL_MAG_THRESH", "abc"),
            ("LOCAL_MAG_THRESH", "3.5"),
            ("SIMILAR_TIME_DELTA_MIN", "5"),
            ("MATRIX_ROOM_ID", " !room:example.org "),
            ("NOTIFY_DRY_RUN", "true"),
            ("PHIVOLCS_BASE_URL", "http://localhost:8080/"),
        ]);
        let mut c = MonitorConfig::default();
        c.apply_env(|k| vars.get(k).cloned());

        assert_eq!(c.source.parse_limit, 50);
        assert_eq!(c.geo.ref_lat, 14.6);
        assert_eq!(c.geo.ref_lon, 123.90);
        assert_eq!(c.geo.radius_km, 110.0);
        assert_eq!(c.geo.global_threshold, 4.5);
        assert_eq!(c.geo.local_threshold, 3.5);
        assert_eq!(c.resolver.window_minutes, 5);
        assert_eq!(c.notify.matrix.room_id.as_deref(), Some("!room:example.org"));
        assert!(c.notify.matrix.any_set());
        assert!(c.notify.dry_run);
        assert_eq!(c.source.base_url, "http://localhost:8080");
    }

    #[test]
    fn toml_file_fills_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("quake_monitor.toml");
        std::fs::write(
            &p,
            r#"
poll_interval_secs = 60
state_dir = "/var/lib/quake"

[geo]
ref_lat = 7.07
ref_lon = 125.61

[notify.matrix]
base_url = "https://matrix.example.org"
"#,
        )
        .unwrap();
        let c = MonitorConfig::load_from_file(&p).unwrap();
        assert_eq!(c.poll_interval_secs, 60);
        assert_eq!(c.geo.ref_lat, 7.07);
        assert_eq!(c.geo.radius_km, 110.0);
        assert_eq!(c.last_poll_path(), PathBuf::from("/var/lib/quake/last_quakes.json"));
        assert_eq!(c.notify.matrix.base_url.as_deref(), Some("https://matrix.example.org"));
        assert_eq!(c.source.parse_limit, 500);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.toml");
        std::fs::write(&p, "poll_interval_secs = \"soon\"").unwrap();
        assert!(MonitorConfig::load_from_file(&p).is_err());
    }
}
