// tests/config_env.rs
use serial_test::serial;
use std::io::Write;

use quake_monitor::MonitorConfig;

const VARS: &[&str] = &[
    "QUAKE_MONITOR_CONFIG",
    "PARSE_LIMIT",
    "REF_POINT_LAT",
    "LOCAL_MAG_THRESH",
    "SIMILAR_TIME_DELTA_MIN",
    "STATE_DIR",
    "MATRIX_ROOM_ID",
    "NOTIFY_DRY_RUN",
];

fn clear_env() {
    for v in VARS {
        std::env::remove_var(v);
    }
}

#[test]
#[serial]
fn missing_explicit_config_file_is_fatal() {
    clear_env();
    std::env::set_var("QUAKE_MONITOR_CONFIG", "/definitely/not/here.toml");
    let err = MonitorConfig::load().unwrap_err();
    assert!(err.to_string().contains("QUAKE_MONITOR_CONFIG"));
    clear_env();
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        f,
        r#"
poll_interval_secs = 60
state_dir = "/var/lib/quake"

[source]
parse_limit = 50

[geo]
local_threshold = 3.5
"#
    )
    .unwrap();

    std::env::set_var("QUAKE_MONITOR_CONFIG", f.path());
    std::env::set_var("PARSE_LIMIT", "25");
    std::env::set_var("SIMILAR_TIME_DELTA_MIN", "5");
    std::env::set_var("MATRIX_ROOM_ID", "!abc:example.org");
    std::env::set_var("NOTIFY_DRY_RUN", "yes");

    let cfg = MonitorConfig::load().unwrap();
    assert_eq!(cfg.poll_interval_secs, 60);
    assert_eq!(cfg.source.parse_limit, 25);
    assert_eq!(cfg.geo.local_threshold, 3.5);
    assert_eq!(cfg.resolver.window_minutes, 5);
    assert_eq!(cfg.state_dir, std::path::PathBuf::from("/var/lib/quake"));
    assert_eq!(cfg.notify.matrix.room_id.as_deref(), Some("!abc:example.org"));
    assert!(cfg.notify.dry_run);
    clear_env();
}

#[test]
#[serial]
fn bad_env_values_keep_defaults() {
    clear_env();
    std::env::set_var("PARSE_LIMIT", "lots");
    std::env::set_var("REF_POINT_LAT", "123.0");
    std::env::set_var("LOCAL_MAG_THRESH", "-1");

    let cfg = MonitorConfig::load().unwrap();
    let d = MonitorConfig::default();
    assert_eq!(cfg.source.parse_limit, d.source.parse_limit);
    assert_eq!(cfg.geo.ref_lat, d.geo.ref_lat);
    assert_eq!(cfg.geo.local_threshold, d.geo.local_threshold);
    clear_env();
}
