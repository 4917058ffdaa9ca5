//! Ingest process: subscribes to the recent-change feed and writes one
//! `edition` point per edit into the store.

use anyhow::Result;
use edit_stream_monitor::config::{FeedConfig, StoreConfig};
use edit_stream_monitor::ingest::{default_tags, run_ingest};
use edit_stream_monitor::metrics::Metrics;
use edit_stream_monitor::{telemetry, InfluxClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_stderr();

    let store_cfg = StoreConfig::from_env()?;
    let feed_cfg = FeedConfig::from_env()?;

    let _metrics_server = match &feed_cfg.metrics_addr {
        Some(addr) => Some(Metrics::init()?.serve(addr).await?),
        None => None,
    };

    let writer = InfluxClient::new(&store_cfg)?
        .with_default_tags(default_tags(&feed_cfg.location, &feed_cfg.url));

    tracing::info!(
        url = %feed_cfg.url,
        store = %store_cfg.url,
        bucket = %store_cfg.bucket,
        "connecting to event stream"
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    run_ingest(feed_cfg, Arc::new(writer), cancel).await?;
    Ok(())
}
