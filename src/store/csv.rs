//! Annotated CSV, as returned by the store's query endpoint.
//!
//! A response is one or more tables. Each table starts with a header row
//! naming its columns (optionally preceded by `#` annotation rows) and
//! tables are separated by blank lines. Values may be double-quoted with
//! `""` escapes, and quoted values may span lines.

use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

/// One result row keyed by column name.
pub type Record = BTreeMap<String, String>;

/// Split raw CSV text into rows of fields. A blank line yields an empty row.
fn split_rows(body: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                if !row.is_empty() || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                }
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !row.is_empty() || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Parse a query response into records. An `error` column with a value
/// turns the whole response into an error.
pub fn parse_records(body: &str) -> Result<Vec<Record>> {
    let mut out = Vec::new();
    let mut header: Option<Vec<String>> = None;

    for row in split_rows(body) {
        if row.is_empty() {
            header = None;
            continue;
        }
        if row[0].starts_with('#') {
            continue;
        }
        let Some(cols) = &header else {
            header = Some(row);
            continue;
        };

        let record: Record = cols
            .iter()
            .zip(row.into_iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value))
            .collect();

        if let Some(msg) = record.get("error").filter(|m| !m.is_empty()) {
            return Err(anyhow!("store query error: {msg}"));
        }
        out.push(record);
    }
    Ok(out)
}
