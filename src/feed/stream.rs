// src/feed/stream.rs
use anyhow::{Context, Result};
use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use metrics::counter;
use reqwest::{header, Client};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::FeedConfig;

/// Why a single feed connection stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// Server closed the stream or it failed; `retry` is the last server hint.
    Dropped { retry: Option<Duration> },
    /// The processing side hung up.
    ReceiverGone,
    Cancelled,
}

/// Forward every non-empty `data` payload of `events` into `tx`.
///
/// Waits on a full channel, so backpressure reaches the body reader.
pub async fn forward_events<S, E>(
    events: S,
    tx: &mpsc::Sender<String>,
    cancel: &CancellationToken,
) -> StreamEnd
where
    S: Stream<Item = Result<Event, EventStreamError<E>>>,
    E: Display,
{
    let mut retry = None;
    futures::pin_mut!(events);
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return StreamEnd::Cancelled,
            next = events.next() => next,
        };
        let ev = match next {
            None => return StreamEnd::Dropped { retry },
            Some(Err(e)) => {
                tracing::warn!(target: "feed", error = %e, "feed stream error");
                return StreamEnd::Dropped { retry };
            }
            Some(Ok(ev)) => ev,
        };
        if ev.retry.is_some() {
            retry = ev.retry;
        }
        if ev.data.trim().is_empty() {
            continue;
        }
        counter!("feed_messages_total").increment(1);
        if tx.send(ev.data).await.is_err() {
            return StreamEnd::ReceiverGone;
        }
    }
}

async fn connect(client: &Client, url: &str) -> Result<reqwest::Response> {
    client
        .get(url)
        .header(header::ACCEPT, "text/event-stream")
        .send()
        .await
        .context("feed connect")?
        .error_for_status()
        .context("feed non-2xx")
}

/// Subscribe to the feed and push message bodies into `tx` until cancelled
/// or the receiver is dropped. Reconnects after a fixed delay (or the
/// server's `retry:` hint) whenever the connection drops.
pub async fn run_feed(
    cfg: FeedConfig,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) -> Result<()> {
    let client = Client::builder()
        .connect_timeout(cfg.connect_timeout)
        .build()
        .context("building feed http client")?;

    loop {
        tracing::info!(target: "feed", url = %cfg.url, "connecting to event stream");
        let delay = match connect(&client, &cfg.url).await {
            Ok(rsp) => {
                let events = rsp.bytes_stream().eventsource();
                match forward_events(events, &tx, &cancel).await {
                    StreamEnd::Cancelled | StreamEnd::ReceiverGone => return Ok(()),
                    StreamEnd::Dropped { retry } => retry.unwrap_or(cfg.reconnect_delay),
                }
            }
            Err(e) => {
                tracing::warn!(target: "feed", error = ?e, "feed connection failed");
                cfg.reconnect_delay
            }
        };

        counter!("feed_reconnects_total").increment(1);
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
