//! Pushes a new-quake alert and a revision through the configured notifiers.
//! Without Matrix settings (or with NOTIFY_DRY_RUN=1) the messages are only logged.

use quake_monitor::config::MonitorConfig;
use quake_monitor::{NotifierMux, QuakeAlert, QuakeRecord};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = MonitorConfig::load()?;
    let mux = NotifierMux::from_config(&cfg.notify);
    tracing::info!(sinks = ?mux.names(), "notify-demo");

    let first = QuakeRecord::new(
        "30 September 2025 - 09:59:43 PM",
        "11.08",
        "124.06",
        "010",
        "6.9",
        "019 km N 61° E of Bogo City (Cebu)",
        format!(
            "{}/2025_Earthquake_Information/September/2025_0930_135943_B1.html",
            cfg.source.base_url
        ),
    );
    let mut update = first.clone();
    update.magnitude = "6.7".into();
    update.depth = "005".into();
    update.bulletin_reference = first.bulletin_reference.replace("_B1.html", "_B2F.html");

    let alerts = [
        QuakeAlert::new_quake(first.clone()),
        QuakeAlert::revision(update, first),
    ];
    let mut failures = 0;
    for alert in &alerts {
        failures += mux.notify(alert).await;
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
    }

    println!("notify-demo done ({failures} failed deliveries)");
    Ok(())
}
