//! Edit feed: the JSON payload model and the server-sent-events subscriber.

pub mod stream;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

pub use stream::{forward_events, run_feed, StreamEnd};

/// Size change of an edited page, in bytes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EditLength {
    #[serde(default)]
    pub old: Option<f64>,
    #[serde(default)]
    pub new: Option<f64>,
}

/// The fields of a recent-change message this system cares about.
/// Everything else in the payload is ignored.
///
/// `user` and `bot` are kept as raw JSON and passed through as tag text
/// without checking their shape.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EditEvent {
    #[serde(default)]
    pub length: Option<EditLength>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub bot: Option<Value>,
}

impl EditEvent {
    /// New page length, present only for edits and page creations.
    pub fn edited_length(&self) -> Option<f64> {
        self.length.as_ref().and_then(|l| l.new)
    }

    pub fn user_tag(&self) -> Option<String> {
        tag_text(self.user.as_ref())
    }

    pub fn bot_tag(&self) -> Option<String> {
        tag_text(self.bot.as_ref())
    }
}

/// Tag text for a raw payload value: strings as-is, other scalars in their
/// JSON form, `None` for absent or null.
fn tag_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse one message body.
pub fn parse_event(data: &str) -> Result<EditEvent> {
    serde_json::from_str(data).context("parsing feed message json")
}
