//! quake-monitor binary entrypoint.
//! Polls the PHIVOLCS latest-earthquake table and posts new/revised quakes.

use quake_monitor::{Monitor, MonitorConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str =
    "quake_monitor=info,monitor=info,ingest=info,classify=info,notify=info,store=info,retention=info,config=info,warn";

/// `RUST_LOG` filter (default: our targets at info, everything else warn);
/// JSON lines when `LOG_FORMAT=json`.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = MonitorConfig::load()?;

    if let Some(addr) = &cfg.metrics_addr {
        quake_monitor::telemetry::install_exporter(addr)?;
    }

    let monitor = Monitor::from_config(&cfg)?;
    tracing::info!(
        target: "monitor",
        source = %cfg.source.base_url,
        parse_limit = cfg.source.parse_limit,
        state_dir = %cfg.state_dir.display(),
        "🌋 earthquake monitor started"
    );

    monitor.run_until_shutdown().await;
    Ok(())
}
