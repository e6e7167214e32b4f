//! Input normalization: canonical tabular rows into [`WorkEvent`]s.
//!
//! Column names must already be canonical (see [`columns`]); mapping
//! spreadsheet-specific headers onto them is the ingestion layer's job.
//! Missing required columns abort with [`EngineError::Schema`]. Rows that
//! cannot be parsed are skipped and reported as [`RowIssue`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{EngineError, RowIssue};
use crate::event::WorkEvent;
use crate::time_of_day;

/// Canonical column names.
pub mod columns {
    pub const OPERATOR: &str = "operator";
    pub const TIMESTAMP: &str = "timestamp";
    pub const DATA_ENTRY_PERSON: &str = "data_entry_person";
    pub const DATE: &str = "date";

    /// Columns without which no analysis is possible.
    pub const REQUIRED: [&str; 2] = [OPERATOR, TIMESTAMP];
}

const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A batch of string cells under a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl InputTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of a column, matched case-insensitively after trimming.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }
}

/// Result of normalizing an [`InputTable`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Events in input order.
    pub events: Vec<WorkEvent>,
    /// Rows that were skipped, in input order.
    pub issues: Vec<RowIssue>,
}

/// Parses a timestamp cell, falling back to a bare time of day on `date`.
pub fn parse_timestamp(value: &str, date: Option<NaiveDate>) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt);
    }
    date.zip(time_of_day::parse(value))
        .map(|(d, t)| d.and_time(t))
}

/// Parses a date cell.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Converts the table into events, failing only on missing required columns.
pub fn normalize(table: &InputTable) -> Result<Normalized, EngineError> {
    let (Some(operator_idx), Some(timestamp_idx)) = (
        table.column(columns::OPERATOR),
        table.column(columns::TIMESTAMP),
    ) else {
        let missing = columns::REQUIRED
            .into_iter()
            .filter(|name| table.column(name).is_none())
            .collect();
        return Err(EngineError::Schema { missing });
    };
    let person_idx = table.column(columns::DATA_ENTRY_PERSON);
    let date_idx = table.column(columns::DATE);

    let mut normalized = Normalized {
        events: Vec::with_capacity(table.rows.len()),
        issues: Vec::new(),
    };

    for (row, cells) in table.rows.iter().enumerate() {
        let cell = move |idx: usize| cells.get(idx).map_or("", |c| c.trim());

        let operator = cell(operator_idx);
        if operator.is_empty() {
            normalized.issues.push(RowIssue::MissingOperator { row });
            continue;
        }

        let date = match date_idx.map(cell).filter(|v| !v.is_empty()) {
            None => None,
            Some(value) => match parse_date(value) {
                Some(date) => Some(date),
                None => {
                    normalized.issues.push(RowIssue::BadDate {
                        row,
                        value: value.to_string(),
                    });
                    continue;
                }
            },
        };

        let raw_timestamp = cell(timestamp_idx);
        let Some(timestamp) = parse_timestamp(raw_timestamp, date) else {
            normalized.issues.push(RowIssue::BadTimestamp {
                row,
                value: raw_timestamp.to_string(),
            });
            continue;
        };

        let person = person_idx.map(cell).map(str::to_string);
        let event = WorkEvent::new(operator, person, timestamp);
        normalized.events.push(match date {
            Some(date) => event.with_date(date),
            None => event,
        });
    }

    for issue in normalized.issues.iter().take(20) {
        tracing::debug!(%issue, "skipping row");
    }

    Ok(normalized)
}
