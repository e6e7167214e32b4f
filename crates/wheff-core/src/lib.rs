//! Core analysis engine for warehouse efficiency reports.
//!
//! This crate contains the fundamental types and logic for:
//! - Input normalization: turning canonical tabular rows into work events
//! - Exclusion rules: daily windows removed from idle and working time
//! - Gap analysis: idle detection and AM/PM bucketing per operator-day
//! - Aggregation: the summary, segment and idle-gap tables
//!
//! The engine is a pure function of its inputs. Each call to [`run`] owns its
//! rules and configuration and nothing is retained between calls.

mod analysis;
pub mod config;
mod engine;
pub mod error;
pub mod event;
pub mod exclusion;
pub mod input;
pub mod report;
pub mod segment;
pub mod time_of_day;

pub use analysis::{DayAnalysis, IdleGap, SpanMetrics, analyze};
pub use config::{EngineConfig, GroupBy};
pub use engine::{run, run_events};
pub use error::{EngineError, EngineWarning, RowIssue};
pub use event::WorkEvent;
pub use exclusion::{ExclusionRule, ExclusionSet};
pub use input::{InputTable, Normalized, normalize};
pub use report::{BatchStats, EngineReport, IdleGapRow, PersonDayRow, SegmentRow};
pub use segment::Segment;
