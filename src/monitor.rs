//! # Aggregation query loop
//! Polls the store for per-classification edit counts over a short trailing
//! window and feeds each row into the [`Dashboard`], redrawing after every
//! push. Ticks are awaited one at a time, so they never overlap.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;
use crate::render::Dashboard;
use crate::store::{aggregate_query, AggregateRow, AggregateSource};

pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("monitor_ticks_total", "Query ticks run.");
        describe_counter!("monitor_query_errors_total", "Query ticks that failed.");
        describe_counter!("monitor_rows_total", "Aggregate rows pushed into the series.");
        describe_gauge!("monitor_last_tick_ts", "Unix ts of the last query tick.");
        describe_histogram!("store_query_ms", "Store query time in milliseconds.");
    });
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Query succeeded; `rows` samples were pushed, `rendered` of them drew a frame.
    Applied { rows: usize, rendered: usize },
    /// Query failed; the series are untouched.
    Failed,
}

/// Push each row into its series and render after every push.
/// Returns how many renders drew a frame.
pub fn apply_rows(dashboard: &mut Dashboard, rows: &[AggregateRow]) -> usize {
    let mut rendered = 0;
    for row in rows {
        dashboard.push(row.series(), row.value as f64);
        if dashboard.render() {
            rendered += 1;
        }
    }
    rendered
}

/// The query side of the system: a store handle, the fixed query text and
/// the dashboard it drives.
pub struct QueryLoop {
    source: Arc<dyn AggregateSource>,
    flux: String,
    dashboard: Dashboard,
}

impl QueryLoop {
    pub fn new(
        source: Arc<dyn AggregateSource>,
        bucket: &str,
        window: &str,
        dashboard: Dashboard,
    ) -> Self {
        Self {
            source,
            flux: aggregate_query(bucket, window),
            dashboard,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn query(&self) -> &str {
        &self.flux
    }

    /// Run one query and apply its rows. Errors are logged, never returned.
    pub async fn tick(&mut self) -> TickOutcome {
        ensure_metrics_described();
        counter!("monitor_ticks_total").increment(1);
        gauge!("monitor_last_tick_ts").set(chrono::Utc::now().timestamp() as f64);

        match self.source.query_rows(&self.flux).await {
            Ok(rows) => {
                counter!("monitor_rows_total").increment(rows.len() as u64);
                let rendered = apply_rows(&mut self.dashboard, &rows);
                TickOutcome::Applied {
                    rows: rows.len(),
                    rendered,
                }
            }
            Err(e) => {
                counter!("monitor_query_errors_total").increment(1);
                tracing::warn!(target: "monitor", error = ?e, "query failed");
                TickOutcome::Failed
            }
        }
    }

    /// Tick every `cfg.interval` until cancelled (or `cfg.max_ticks` is
    /// reached), calling `on_tick` after each one. Returns the tick count.
    pub async fn run<F>(
        &mut self,
        cfg: &MonitorConfig,
        cancel: &CancellationToken,
        mut on_tick: F,
    ) -> u64
    where
        F: FnMut(&Dashboard, TickOutcome),
    {
        let mut ticker = interval(cfg.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = 0u64;

        loop {
            if cfg.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.tick() => outcome,
            };
            ticks += 1;
            on_tick(&self.dashboard, outcome);
        }

        tracing::info!(target: "monitor", ticks, "query loop stopped");
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartConfig;
    use crate::rolling::SeriesId;

    #[test]
    fn rows_route_by_tag_and_render_after_each_push() {
        let mut d = Dashboard::new(100, ChartConfig::default());
        let rows = vec![AggregateRow::new("true", 7), AggregateRow::new("false", 12)];
        // first push leaves humans empty, so only the second one draws
        assert_eq!(apply_rows(&mut d, &rows), 1);
        assert_eq!(d.series().get(SeriesId::Bot).to_vec(), vec![7.0]);
        assert_eq!(d.series().get(SeriesId::Human).to_vec(), vec![12.0]);
    }

    #[test]
    fn partial_tick_only_touches_present_series() {
        let mut d = Dashboard::new(100, ChartConfig::default());
        apply_rows(&mut d, &[AggregateRow::new("true", 1), AggregateRow::new("false", 2)]);
        apply_rows(&mut d, &[AggregateRow::new("false", 5)]);
        assert_eq!(d.series().bots().to_vec(), vec![1.0]);
        assert_eq!(d.series().humans().to_vec(), vec![2.0, 5.0]);
    }
}
