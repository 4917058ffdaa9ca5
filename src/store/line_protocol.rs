// src/store/line_protocol.rs
use std::collections::BTreeMap;

/// A single store point: measurement, tags, one float field and an optional
/// timestamp in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub field: (String, f64),
    pub timestamp_secs: Option<i64>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            field: ("value".to_string(), 0.0),
            timestamp_secs: None,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn float_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.field = (name.into(), value);
        self
    }

    pub fn timestamp(mut self, secs: i64) -> Self {
        self.timestamp_secs = Some(secs);
        self
    }

    /// Encode as one line of line protocol. `defaults` are merged under the
    /// point's own tags; tags are emitted sorted by key and empty values are
    /// dropped (the store rejects them).
    pub fn to_line(&self, defaults: &BTreeMap<String, String>) -> String {
        let mut tags = defaults.clone();
        tags.extend(self.tags.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut out = escape_measurement(&self.measurement);
        for (k, v) in tags.iter().filter(|(k, v)| !k.is_empty() && !v.is_empty()) {
            out.push(',');
            out.push_str(&escape_tag(k));
            out.push('=');
            out.push_str(&escape_tag(v));
        }
        out.push(' ');
        out.push_str(&escape_tag(&self.field.0));
        out.push('=');
        out.push_str(&format_float(self.field.1));
        if let Some(ts) = self.timestamp_secs {
            out.push(' ');
            out.push_str(&ts.to_string());
        }
        out
    }
}

fn escape_measurement(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ',' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_tag(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ',' | ' ' | '=' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Floats are written without a type suffix; integral values drop the `.0`.
fn format_float(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        "0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> BTreeMap<String, String> {
        [
            ("location", "host-1"),
            ("source", "wikimedia"),
            ("sseUrl", "https://stream.wikimedia.org/v2/stream/recentchange"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn encodes_sorted_tags_field_and_seconds() {
        let p = Point::new("edition")
            .tag("user", "Alice")
            .tag("isBot", "false")
            .float_field("value", 1234.0)
            .timestamp(1_700_000_000);
        assert_eq!(
            p.to_line(&defaults()),
            "edition,isBot=false,location=host-1,source=wikimedia,\
             sseUrl=https://stream.wikimedia.org/v2/stream/recentchange,user=Alice \
             value=1234 1700000000"
        );
    }

    #[test]
    fn escapes_spaces_commas_and_equals_in_tags() {
        let p = Point::new("edition")
            .tag("user", "Jane Doe, a=b")
            .float_field("value", 0.5);
        assert_eq!(
            p.to_line(&BTreeMap::new()),
            r"edition,user=Jane\ Doe\,\ a\=b value=0.5"
        );
    }

    #[test]
    fn point_tags_override_defaults_and_empty_tags_are_dropped() {
        let p = Point::new("edition")
            .tag("source", "replay")
            .tag("user", "")
            .float_field("value", -3.0);
        let line = p.to_line(&defaults());
        assert!(line.contains("source=replay"));
        assert!(!line.contains("user="));
        assert!(line.ends_with(" value=-3"));
    }
}
