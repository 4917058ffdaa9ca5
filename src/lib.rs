// src/lib.rs
// Public library surface for both binaries and the integration tests.

pub mod chart;
pub mod config;
pub mod feed;
pub mod ingest;
pub mod metrics;
pub mod monitor;
pub mod render;
pub mod rolling;
pub mod store;
pub mod telemetry;
pub mod tui;

// ---- Re-exports for stable public API ----
pub use crate::chart::{ChartConfig, SeriesColor};
pub use crate::render::{Dashboard, Frame};
pub use crate::rolling::{DualSeries, RollingSeries, SeriesId};
pub use crate::store::{AggregateRow, AggregateSource, InfluxClient, Point, PointWriter};
