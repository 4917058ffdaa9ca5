//! Time-series store access: the point model, the query result model and
//! the two narrow seams the pipeline talks through ([`PointWriter`] for the
//! ingest side, [`AggregateSource`] for the query side).

pub mod client;
pub mod csv;
pub mod line_protocol;

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;

use crate::rolling::SeriesId;

pub use client::InfluxClient;
pub use line_protocol::Point;

/// Measurement every edit point is written under.
pub const MEASUREMENT: &str = "edition";

/// Sink for single points. Implementations must be cheap to share across tasks.
#[async_trait::async_trait]
pub trait PointWriter: Send + Sync {
    /// Write and flush one point.
    async fn write_point(&self, point: &Point) -> Result<()>;
}

/// Source of windowed per-classification counts.
#[async_trait::async_trait]
pub trait AggregateSource: Send + Sync {
    async fn query_rows(&self, flux: &str) -> Result<Vec<AggregateRow>>;
}

/// One per-classification count from a query tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    /// Raw `isBot` tag text as returned by the store (`"true"` / `"false"`).
    pub is_bot: String,
    pub value: i64,
}

impl AggregateRow {
    pub fn new(is_bot: impl Into<String>, value: i64) -> Self {
        Self {
            is_bot: is_bot.into(),
            value,
        }
    }

    pub fn series(&self) -> SeriesId {
        SeriesId::from_tag(&self.is_bot)
    }

    /// Build a row from one result record (`isBot` + `_value` columns).
    pub fn from_record(record: &BTreeMap<String, String>) -> Result<Self> {
        let is_bot = record.get("isBot").cloned().unwrap_or_default();
        let raw = record
            .get("_value")
            .ok_or_else(|| anyhow!("result row has no _value column"))?;
        let value = raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("parsing _value {raw:?} as a count"))?;
        Ok(Self { is_bot, value })
    }
}

/// Flux text counting edit points per classification over `window`
/// (a Flux duration such as `-10s`).
pub fn aggregate_query(bucket: &str, window: &str) -> String {
    format!(
        "from(bucket:\"{bucket}\") \
         |> range(start: {window}) \
         |> filter(fn:(r) => r._measurement == \"{MEASUREMENT}\") \
         |> group(columns: [\"isBot\"]) \
         |> count()"
    )
}
