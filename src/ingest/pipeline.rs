// src/ingest/pipeline.rs
use anyhow::Result;
use metrics::counter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{ensure_metrics_described, handle_message, Handled};
use crate::config::FeedConfig;
use crate::feed::run_feed;
use crate::store::{Point, PointWriter};

/// Per-run ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub messages: u64,
    pub skipped: u64,
    pub invalid: u64,
    pub points: u64,
    pub written: u64,
    pub write_errors: u64,
}

impl IngestStats {
    fn record_write(&mut self, ok: bool) {
        if ok {
            self.written += 1;
        } else {
            self.write_errors += 1;
        }
    }
}

async fn write_one(writer: Arc<dyn PointWriter>, point: Point) -> bool {
    match writer.write_point(&point).await {
        Ok(()) => {
            counter!("ingest_points_written_total").increment(1);
            true
        }
        Err(e) => {
            counter!("ingest_write_errors_total").increment(1);
            tracing::error!(target: "ingest", error = ?e, "store write failed");
            false
        }
    }
}

/// Drain feed messages from `rx`, writing one point per edit.
///
/// Writes are spawned so a slow store never blocks intake. When `rx` closes
/// the in-flight writes are awaited; on cancellation they are abandoned.
pub async fn process_messages(
    mut rx: mpsc::Receiver<String>,
    writer: Arc<dyn PointWriter>,
    cancel: CancellationToken,
) -> IngestStats {
    ensure_metrics_described();
    let mut stats = IngestStats::default();
    let mut in_flight: JoinSet<bool> = JoinSet::new();

    loop {
        let msg = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(target: "ingest", pending = in_flight.len(), "ingest cancelled");
                return stats;
            }
            msg = rx.recv() => msg,
        };
        let Some(data) = msg else { break };
        stats.messages += 1;

        let now = chrono::Utc::now().timestamp();
        match handle_message(&data, now) {
            Handled::Skipped => {
                stats.skipped += 1;
                counter!("ingest_skipped_total").increment(1);
            }
            Handled::Invalid => {
                stats.invalid += 1;
                counter!("feed_parse_errors_total").increment(1);
            }
            Handled::Point(point) => {
                stats.points += 1;
                counter!("ingest_points_total").increment(1);
                tracing::debug!(
                    target: "ingest",
                    user = %point.tags.get("user").map(String::as_str).unwrap_or_default(),
                    value = point.field.1,
                    "edit point"
                );
                in_flight.spawn(write_one(writer.clone(), point));
            }
        }

        while let Some(done) = in_flight.try_join_next() {
            stats.record_write(done.unwrap_or(false));
        }
    }

    while let Some(done) = in_flight.join_next().await {
        stats.record_write(done.unwrap_or(false));
    }
    stats
}

/// Run the ingest process: one feed receiver task feeding one processor
/// through a bounded channel. Returns when cancelled or when the processor
/// has drained a closed feed.
pub async fn run_ingest(
    cfg: FeedConfig,
    writer: Arc<dyn PointWriter>,
    cancel: CancellationToken,
) -> Result<IngestStats> {
    let (tx, rx) = mpsc::channel(cfg.channel_capacity);
    let feed_cancel = cancel.child_token();
    let feed = tokio::spawn(run_feed(cfg, tx, feed_cancel.clone()));

    let stats = process_messages(rx, writer, cancel).await;
    feed_cancel.cancel();
    match feed.await {
        Ok(res) => res?,
        Err(e) => tracing::warn!(target: "ingest", error = ?e, "feed task ended abnormally"),
    }

    tracing::info!(
        target: "ingest",
        messages = stats.messages,
        points = stats.points,
        written = stats.written,
        write_errors = stats.write_errors,
        "ingest stopped"
    );
    Ok(stats)
}
