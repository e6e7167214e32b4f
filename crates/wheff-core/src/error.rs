//! Error and warning types for the analysis engine.
//!
//! Structural problems abort a run with [`EngineError`]. Row-level problems
//! are recovered locally as [`RowIssue`]s and reported in aggregate.

use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;

/// Errors that abort an engine run before any computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A required column is absent from the input table.
    #[error("missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<&'static str> },

    /// The configuration cannot produce meaningful results.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A single input row that was skipped during normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowIssue {
    /// The operator cell is blank.
    #[error("row {row}: missing operator")]
    MissingOperator { row: usize },

    /// The timestamp cell is blank or could not be parsed.
    #[error("row {row}: unparseable timestamp {value:?}")]
    BadTimestamp { row: usize, value: String },

    /// The date cell is present but could not be parsed.
    #[error("row {row}: unparseable date {value:?}")]
    BadDate { row: usize, value: String },
}

impl RowIssue {
    /// Zero-based index of the offending data row.
    pub const fn row(&self) -> usize {
        match self {
            Self::MissingOperator { row }
            | Self::BadTimestamp { row, .. }
            | Self::BadDate { row, .. } => *row,
        }
    }
}

/// Non-fatal conditions reported alongside a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// Every row was dropped or excluded; the tables are empty.
    EmptyResult,

    /// An exclusion rule ends before it starts and was ignored.
    IgnoredRule {
        index: usize,
        start_time: NaiveTime,
        end_time: NaiveTime,
    },
}
