use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder with its own HTTP listener on `addr`
/// (serves `/metrics`). Must run inside the tokio runtime.
pub fn install_exporter(addr: &str) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid METRICS_ADDR {addr:?}"))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install exporter")?;
    crate::ingest::ensure_metrics_described();
    tracing::info!(target: "monitor", %addr, "metrics exporter listening");
    Ok(())
}
