// tests/metrics_monitor.rs
use anyhow::{anyhow, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use edit_stream_monitor::metrics::Metrics;
use edit_stream_monitor::monitor::{QueryLoop, TickOutcome};
use edit_stream_monitor::{AggregateRow, AggregateSource, ChartConfig, Dashboard};
use std::sync::Arc;
use tower::ServiceExt;

struct DownStore;

#[async_trait::async_trait]
impl AggregateSource for DownStore {
    async fn query_rows(&self, _flux: &str) -> Result<Vec<AggregateRow>> {
        Err(anyhow!("connection refused"))
    }
}

#[tokio::test]
async fn failed_query_ticks_are_exposed() {
    // Install the process recorder for this test binary
    let metrics = Metrics::init().expect("recorder");

    let mut query_loop = QueryLoop::new(
        Arc::new(DownStore),
        "js-sample",
        "-10s",
        Dashboard::new(100, ChartConfig::default()),
    );
    assert_eq!(query_loop.tick().await, TickOutcome::Failed);
    assert_eq!(query_loop.tick().await, TickOutcome::Failed);
    assert!(query_loop.dashboard().frame().is_none());

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    for needle in [
        "monitor_ticks_total 2",
        "monitor_query_errors_total 2",
        "monitor_last_tick_ts",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
