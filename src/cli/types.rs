//! CLI argument types and parsing helpers.

use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence::recurrence::{end_of_day, start_of_day};

/// Arguments of the `create` command.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub name: String,
    pub user: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub recurrence: String,
    pub until: Option<String>,
    pub max_count: Option<u32>,
    pub copy_links: bool,
    pub category: Option<String>,
    pub kind: Option<String>,
    pub discipline: Option<String>,
    pub phase: Option<String>,
}

/// Result type for commands that do not return an occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "is_null")]
    pub data: serde_json::Value,
}

fn is_null(value: &serde_json::Value) -> bool {
    value.is_null()
}

/// Parse an instant. A bare date means midnight UTC.
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    parse_with_date_fallback(input, start_of_day)
}

/// Parse the end of a range. A bare date means the last millisecond of it.
pub fn parse_range_end(input: &str) -> Result<DateTime<Utc>> {
    parse_with_date_fallback(input, end_of_day)
}

fn parse_with_date_fallback(
    input: &str,
    on_date: fn(NaiveDate) -> DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(on_date(date));
    }
    bail!(
        "invalid date/time '{}': expected RFC 3339, 'YYYY-MM-DD HH:MM' or 'YYYY-MM-DD'",
        input
    )
}
