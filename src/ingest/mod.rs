// src/ingest/mod.rs
pub mod pipeline;

use metrics::describe_counter;
use once_cell::sync::OnceCell;

use crate::config::FEED_SOURCE;
use crate::feed::{parse_event, EditEvent};
use crate::store::{Point, MEASUREMENT};

pub use pipeline::{process_messages, run_ingest, IngestStats};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_messages_total", "Messages received from the feed.");
        describe_counter!(
            "feed_parse_errors_total",
            "Feed messages that were not valid JSON."
        );
        describe_counter!("feed_reconnects_total", "Feed re-subscriptions.");
        describe_counter!("ingest_points_total", "Points built from feed messages.");
        describe_counter!(
            "ingest_skipped_total",
            "Feed messages without a new length (not edits)."
        );
        describe_counter!(
            "ingest_points_written_total",
            "Points acknowledged by the store."
        );
        describe_counter!("ingest_write_errors_total", "Failed point writes.");
    });
}

/// Outcome of handling one feed message.
#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    /// Not an edit (no `length.new`); dropped without a write.
    Skipped,
    /// Body was not a valid JSON message.
    Invalid,
    Point(Point),
}

/// Default tags applied to every point of the ingest writer.
pub fn default_tags(location: &str, feed_url: &str) -> Vec<(String, String)> {
    vec![
        ("location".to_string(), location.to_string()),
        ("source".to_string(), FEED_SOURCE.to_string()),
        ("sseUrl".to_string(), feed_url.to_string()),
    ]
}

/// Build the store point for an edit, or `None` when the event carries no
/// new length. Absent or null `user`/`bot` values leave their tag off.
pub fn point_for(event: &EditEvent, now_secs: i64) -> Option<Point> {
    let value = event.edited_length()?;
    let mut point = Point::new(MEASUREMENT)
        .float_field("value", value)
        .timestamp(now_secs);
    if let Some(user) = event.user_tag() {
        point = point.tag("user", user);
    }
    if let Some(is_bot) = event.bot_tag() {
        point = point.tag("isBot", is_bot);
    }
    Some(point)
}

/// Parse one message body and turn it into a point when it is an edit.
pub fn handle_message(data: &str, now_secs: i64) -> Handled {
    match parse_event(data) {
        Ok(ev) => point_for(&ev, now_secs).map_or(Handled::Skipped, Handled::Point),
        Err(e) => {
            tracing::debug!(target: "ingest", error = ?e, "unparsable feed message");
            Handled::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_becomes_tagged_point() {
        let data = r#"{"user":"Alice","bot":false,"length":{"old":10,"new":25}}"#;
        let Handled::Point(p) = handle_message(data, 1_700_000_000) else {
            panic!("expected a point");
        };
        assert_eq!(p.measurement, "edition");
        assert_eq!(p.tags["user"], "Alice");
        assert_eq!(p.tags["isBot"], "false");
        assert_eq!(p.field, ("value".to_string(), 25.0));
        assert_eq!(p.timestamp_secs, Some(1_700_000_000));
    }

    #[test]
    fn bot_flag_is_rendered_as_tag_text() {
        let data = r#"{"user":"SomeBot","bot":true,"length":{"new":3}}"#;
        let Handled::Point(p) = handle_message(data, 0) else {
            panic!("expected a point");
        };
        assert_eq!(p.tags["isBot"], "true");
    }

    #[test]
    fn message_without_new_length_is_skipped() {
        assert_eq!(
            handle_message(r#"{"type":"log","user":"A","bot":false}"#, 0),
            Handled::Skipped
        );
        assert_eq!(
            handle_message(r#"{"user":"A","bot":false,"length":{"old":4}}"#, 0),
            Handled::Skipped
        );
    }

    #[test]
    fn odd_user_and_bot_shapes_still_produce_a_point() {
        let Handled::Point(p) = handle_message(r#"{"user":"A","bot":"yes","length":{"new":5}}"#, 0)
        else {
            panic!("string bot flag should still be written");
        };
        assert_eq!(p.tags["isBot"], "yes");

        let Handled::Point(p) = handle_message(r#"{"user":null,"bot":true,"length":{"new":5}}"#, 0)
        else {
            panic!("null user should still be written");
        };
        assert!(!p.tags.contains_key("user"));
        assert_eq!(p.tags["isBot"], "true");

        let Handled::Point(p) = handle_message(r#"{"user":"A","length":{"new":5}}"#, 0) else {
            panic!("missing bot flag should still be written");
        };
        assert_eq!(p.tags["user"], "A");
        assert!(!p.tags.contains_key("isBot"));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(handle_message("not json", 0), Handled::Invalid);
    }

    #[test]
    fn default_tags_name_source_and_location() {
        let tags = default_tags("host-a", "https://feed.example/stream");
        assert!(tags.contains(&("source".to_string(), "wikimedia".to_string())));
        assert!(tags.contains(&("location".to_string(), "host-a".to_string())));
        assert!(tags.contains(&("sseUrl".to_string(), "https://feed.example/stream".to_string())));
    }
}
