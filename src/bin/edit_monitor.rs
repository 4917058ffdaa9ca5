//! Query/render process: polls per-classification edit counts and charts
//! bots vs humans in the terminal. `q`, `Esc` or `Ctrl-C` quit.

use anyhow::Result;
use edit_stream_monitor::config::{load_chart_config_default, MonitorConfig, StoreConfig};
use edit_stream_monitor::metrics::Metrics;
use edit_stream_monitor::monitor::QueryLoop;
use edit_stream_monitor::tui::{spawn_key_listener, TuiApp};
use edit_stream_monitor::{telemetry, Dashboard, InfluxClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let store_cfg = StoreConfig::from_env()?;
    let monitor_cfg = MonitorConfig::from_env()?;
    let chart_cfg = load_chart_config_default()?;
    telemetry::init_file(&monitor_cfg.log_file)?;

    let _metrics_server = match &monitor_cfg.metrics_addr {
        Some(addr) => Some(Metrics::init()?.serve(addr).await?),
        None => None,
    };

    let source = InfluxClient::new(&store_cfg)?;
    let dashboard = Dashboard::new(monitor_cfg.capacity, chart_cfg);
    let mut query_loop = QueryLoop::new(
        Arc::new(source),
        &store_cfg.bucket,
        &monitor_cfg.window,
        dashboard,
    );
    tracing::info!(query = query_loop.query(), "starting query loop");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut tui = TuiApp::new()?;
    tui.draw(query_loop.dashboard())?;
    let keys = spawn_key_listener(cancel.clone());

    query_loop
        .run(&monitor_cfg, &cancel, |dashboard, _| {
            if let Err(e) = tui.draw(dashboard) {
                tracing::warn!(error = ?e, "terminal draw failed");
            }
        })
        .await;

    cancel.cancel();
    // the listener polls in 100 ms steps; wait for it off the runtime threads
    let _ = tokio::task::spawn_blocking(move || keys.join()).await;
    drop(tui);
    Ok(())
}
