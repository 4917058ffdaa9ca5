// src/store/client.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use reqwest::{header, Client};
use std::collections::BTreeMap;
use std::time::Instant;

use super::{csv, AggregateRow, AggregateSource, Point, PointWriter};
use crate::config::StoreConfig;

/// HTTP client for the store's v2 write and query endpoints.
#[derive(Clone)]
pub struct InfluxClient {
    base_url: String,
    org: String,
    bucket: String,
    token: String,
    default_tags: BTreeMap<String, String>,
    client: Client,
}

impl InfluxClient {
    /// Build a client with the configured per-request timeout.
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("building store http client")?;
        Ok(Self {
            base_url: cfg.url.trim_end_matches('/').to_string(),
            org: cfg.org.clone(),
            bucket: cfg.bucket.clone(),
            token: cfg.token.clone(),
            default_tags: BTreeMap::new(),
            client,
        })
    }

    /// Tags applied to every point written through this client.
    pub fn with_default_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.default_tags = tags
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Write already-encoded line protocol (one or more lines).
    pub async fn write_lines(&self, body: String) -> Result<()> {
        let url = format!("{}/api/v2/write", self.base_url);
        let rsp = self
            .client
            .post(&url)
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "s"),
            ])
            .header(header::AUTHORIZATION, self.auth_header())
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .context("store write request")?;

        let status = rsp.status();
        if !status.is_success() {
            let text = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("store write failed: {status}: {text}"));
        }
        Ok(())
    }

    /// Run a Flux query and return its records.
    pub async fn query_records(&self, flux: &str) -> Result<Vec<csv::Record>> {
        let t0 = Instant::now();
        let url = format!("{}/api/v2/query", self.base_url);
        let rsp = self
            .client
            .post(&url)
            .query(&[("org", self.org.as_str())])
            .header(header::AUTHORIZATION, self.auth_header())
            .header(header::CONTENT_TYPE, "application/vnd.flux")
            .header(header::ACCEPT, "application/csv")
            .body(flux.to_string())
            .send()
            .await
            .context("store query request")?;

        let status = rsp.status();
        let text = rsp.text().await.context("store query body")?;
        if !status.is_success() {
            return Err(anyhow!("store query failed: {status}: {text}"));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("store_query_ms").record(ms);
        csv::parse_records(&text)
    }
}

#[async_trait]
impl PointWriter for InfluxClient {
    async fn write_point(&self, point: &Point) -> Result<()> {
        self.write_lines(point.to_line(&self.default_tags)).await
    }
}

#[async_trait]
impl AggregateSource for InfluxClient {
    async fn query_rows(&self, flux: &str) -> Result<Vec<AggregateRow>> {
        self.query_records(flux)
            .await?
            .iter()
            .map(AggregateRow::from_record)
            .collect()
    }
}
