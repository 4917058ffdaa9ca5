// src/config.rs
//! Environment-driven configuration for both processes, plus the chart
//! options file.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::chart::ChartConfig;
use crate::rolling::DEFAULT_MAX_LENGTH;

pub const DEFAULT_FEED_URL: &str = "https://stream.wikimedia.org/v2/stream/recentchange";
pub const FEED_SOURCE: &str = "wikimedia";

const ENV_CHART_PATH: &str = "CHART_CONFIG_PATH";
const MAX_CHART_HEIGHT: usize = 100;

/// `METRICS_ADDR` when set and non-empty.
fn metrics_addr_from_env() -> Option<String> {
    std::env::var("METRICS_ADDR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First non-empty value among `keys`, else `default`.
fn env_first(keys: &[&str], default: &str) -> String {
    keys.iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse `key` when set, else `default`. A set but unparsable value is an error.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid {key}={v:?}")),
        _ => Ok(default),
    }
}

fn env_millis(key: &str, default_ms: u64) -> Result<Duration> {
    env_parse(key, default_ms).map(Duration::from_millis)
}

/// Store connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub token: String,
    /// Applied to every write and query request.
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env_first(&["STORE_URL", "INFLUX_URL"], "http://localhost:8086"),
            org: env_first(&["ORG", "INFLUX_ORG"], "sample-org"),
            bucket: env_first(&["BUCKET", "INFLUX_BUCKET"], "js-sample"),
            token: env_first(&["TOKEN", "INFLUX_TOKEN"], "my-token"),
            timeout: env_millis("STORE_TIMEOUT_MS", 5_000)?,
        })
    }
}

/// Feed subscription and ingest pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub reconnect_delay: Duration,
    pub channel_capacity: usize,
    /// Value of the `location` default tag.
    pub location: String,
    /// Serve `/metrics` and `/health` here when set.
    pub metrics_addr: Option<String>,
}

impl FeedConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env_first(&["FEED_URL"], DEFAULT_FEED_URL),
            connect_timeout: env_millis("FEED_CONNECT_TIMEOUT_MS", 10_000)?,
            reconnect_delay: env_millis("FEED_RECONNECT_MS", 3_000)?,
            channel_capacity: env_parse("FEED_CHANNEL_CAPACITY", 1024usize)?.max(1),
            location: env_first(&["LOCATION", "HOSTNAME"], "unknown"),
            metrics_addr: metrics_addr_from_env(),
        })
    }
}

/// Query/render loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub interval: Duration,
    /// Flux `range(start:)` argument, e.g. `-10s`.
    pub window: String,
    /// Stop after this many ticks; `None` runs until cancelled.
    pub max_ticks: Option<u64>,
    pub capacity: usize,
    pub log_file: PathBuf,
    /// Serve `/metrics` and `/health` here when set.
    pub metrics_addr: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            window: "-10s".to_string(),
            max_ticks: None,
            capacity: DEFAULT_MAX_LENGTH,
            log_file: PathBuf::from("edit-monitor.log"),
            metrics_addr: None,
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let max_ticks = match std::env::var("MAX_TICKS") {
            Ok(v) if !v.trim().is_empty() => Some(
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid MAX_TICKS={v:?}"))?,
            ),
            _ => None,
        };
        Ok(Self {
            interval: env_millis("QUERY_INTERVAL_MS", 500)?,
            window: env_first(&["QUERY_WINDOW"], &d.window),
            max_ticks,
            capacity: d.capacity,
            log_file: PathBuf::from(env_first(
                &["MONITOR_LOG_FILE"],
                &d.log_file.display().to_string(),
            )),
            metrics_addr: metrics_addr_from_env(),
        })
    }
}

/// Load chart options from an explicit path. Supports TOML or JSON formats.
pub fn load_chart_config_from(path: &Path) -> Result<ChartConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading chart config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_chart_config(&content, ext.as_str())
}

/// Load chart options using env var + fallbacks:
/// 1) $CHART_CONFIG_PATH
/// 2) config/chart.toml
/// 3) config/chart.json
/// 4) built-in defaults
pub fn load_chart_config_default() -> Result<ChartConfig> {
    if let Ok(p) = std::env::var(ENV_CHART_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_chart_config_from(&pb);
        }
        return Err(anyhow!("CHART_CONFIG_PATH points to non-existent path"));
    }
    for candidate in ["config/chart.toml", "config/chart.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_chart_config_from(&p);
        }
    }
    Ok(ChartConfig::default())
}

fn parse_chart_config(s: &str, hint_ext: &str) -> Result<ChartConfig> {
    let parsed = if hint_ext == "json" || s.trim_start().starts_with('{') {
        serde_json::from_str::<ChartConfig>(s).context("parsing chart config json")?
    } else {
        toml::from_str::<ChartConfig>(s).context("parsing chart config toml")?
    };
    Ok(sanitize(parsed))
}

fn sanitize(mut cfg: ChartConfig) -> ChartConfig {
    cfg.height = cfg.height.clamp(1, MAX_CHART_HEIGHT);
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::SeriesColor;
    use std::{env, fs};

    #[test]
    fn chart_config_formats_and_clamping() {
        let toml = "height = 500\ncolors = [\"green\", \"yellow\"]";
        let t = parse_chart_config(toml, "toml").unwrap();
        assert_eq!(t.height, MAX_CHART_HEIGHT);
        assert_eq!(t.colors, vec![SeriesColor::Green, SeriesColor::Yellow]);

        let json = r#"{"height": 0}"#;
        let j = parse_chart_config(json, "").unwrap();
        assert_eq!(j.height, 1);
        assert_eq!(j.colors, ChartConfig::default().colors);

        assert!(parse_chart_config("height = \"tall\"", "toml").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn chart_default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CHART_PATH);

        // no files → defaults
        assert_eq!(load_chart_config_default().unwrap(), ChartConfig::default());

        fs::create_dir_all("config").unwrap();
        fs::write("config/chart.toml", "height = 9").unwrap();
        assert_eq!(load_chart_config_default().unwrap().height, 9);

        // env wins over the fallback file
        let p_json = tmp.path().join("chart.json");
        fs::write(&p_json, r#"{"height": 4, "colors": ["cyan"]}"#).unwrap();
        env::set_var(ENV_CHART_PATH, p_json.display().to_string());
        let c = load_chart_config_default().unwrap();
        assert_eq!(c.height, 4);
        assert_eq!(c.colors, vec![SeriesColor::Cyan]);

        env::set_var(ENV_CHART_PATH, tmp.path().join("missing.toml"));
        assert!(load_chart_config_default().is_err());
        env::remove_var(ENV_CHART_PATH);

        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn store_config_prefers_primary_names_then_aliases() {
        for k in ["BUCKET", "INFLUX_BUCKET", "ORG", "INFLUX_ORG", "STORE_URL", "INFLUX_URL"] {
            env::remove_var(k);
        }
        env::remove_var("STORE_TIMEOUT_MS");
        let d = StoreConfig::from_env().unwrap();
        assert_eq!(d.bucket, "js-sample");
        assert_eq!(d.org, "sample-org");
        assert_eq!(d.url, "http://localhost:8086");
        assert_eq!(d.timeout, Duration::from_millis(5_000));

        env::set_var("INFLUX_BUCKET", "legacy");
        assert_eq!(StoreConfig::from_env().unwrap().bucket, "legacy");
        env::set_var("BUCKET", "primary");
        assert_eq!(StoreConfig::from_env().unwrap().bucket, "primary");

        env::set_var("STORE_TIMEOUT_MS", "soon");
        assert!(StoreConfig::from_env().is_err());

        for k in ["BUCKET", "INFLUX_BUCKET", "STORE_TIMEOUT_MS"] {
            env::remove_var(k);
        }
    }

    #[serial_test::serial]
    #[test]
    fn monitor_config_runs_until_cancelled_by_default() {
        env::remove_var("MAX_TICKS");
        env::remove_var("QUERY_INTERVAL_MS");
        let m = MonitorConfig::from_env().unwrap();
        assert_eq!(m.max_ticks, None);
        assert_eq!(m.interval, Duration::from_millis(500));
        assert_eq!(m.capacity, 100);

        env::set_var("MAX_TICKS", "300");
        assert_eq!(MonitorConfig::from_env().unwrap().max_ticks, Some(300));
        env::remove_var("MAX_TICKS");
    }

    #[serial_test::serial]
    #[test]
    fn both_processes_read_the_metrics_address() {
        env::remove_var("METRICS_ADDR");
        assert_eq!(MonitorConfig::from_env().unwrap().metrics_addr, None);

        env::set_var("METRICS_ADDR", " 127.0.0.1:9100 ");
        let addr = Some("127.0.0.1:9100".to_string());
        assert_eq!(MonitorConfig::from_env().unwrap().metrics_addr, addr);
        assert_eq!(FeedConfig::from_env().unwrap().metrics_addr, addr);
        env::remove_var("METRICS_ADDR");
    }
}
