//! Aggregation into the three output tables.
//!
//! - `full`: one [`PersonDayRow`] per (operator, date)
//! - `ampm`: one [`SegmentRow`] per (operator, date, segment) that has events
//! - `idle`: one [`IdleGapRow`] per idle gap
//!
//! Durations are reported as fractional minutes. Rows carry typed dates and
//! times so exporters can format and highlight them without reparsing.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::analysis::{DayAnalysis, SpanMetrics};
use crate::config::EngineConfig;
use crate::error::EngineWarning;
use crate::segment::Segment;

/// Summary metrics for one person-day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonDayRow {
    pub operator: String,
    pub date: NaiveDate,
    pub data_entry_person: Option<String>,
    pub record_count: usize,
    /// Span minus idle and excluded minutes, floored at zero.
    pub total_minutes: f64,
    pub idle_minutes: f64,
    pub idle_count: usize,
    pub excluded_minutes: f64,
    pub first_event: Option<NaiveDateTime>,
    pub last_event: Option<NaiveDateTime>,
    /// Records per working hour; zero when there is no working time.
    pub efficiency: f64,
    pub meets_target: bool,
}

/// Summary metrics for one half of a person-day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub operator: String,
    pub date: NaiveDate,
    pub segment: Segment,
    pub data_entry_person: Option<String>,
    pub record_count: usize,
    pub total_minutes: f64,
    pub idle_minutes: f64,
    pub idle_count: usize,
    pub excluded_minutes: f64,
    pub first_event: Option<NaiveDateTime>,
    pub last_event: Option<NaiveDateTime>,
    pub efficiency: f64,
    pub meets_target: bool,
}

/// One idle gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdleGapRow {
    pub operator: String,
    pub date: NaiveDate,
    pub segment: Segment,
    pub data_entry_person: Option<String>,
    pub gap_start: NaiveDateTime,
    pub gap_end: NaiveDateTime,
    pub minutes: f64,
}

/// Row accounting for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Data rows in the input.
    pub input_rows: usize,
    /// Rows skipped because a field could not be parsed.
    pub dropped_rows: usize,
    /// Events removed because an exclusion rule matched them.
    pub excluded_rows: usize,
    /// Events that reached gap analysis.
    pub analyzed_rows: usize,
    /// Exclusion rules ignored as malformed.
    pub ignored_rules: usize,
}

/// Everything an exporter needs from one engine run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineReport {
    pub full: Vec<PersonDayRow>,
    pub ampm: Vec<SegmentRow>,
    pub idle: Vec<IdleGapRow>,
    /// Records-per-hour target for highlighting rows.
    pub target_efficiency: f64,
    pub stats: BatchStats,
    pub warnings: Vec<EngineWarning>,
}

impl EngineReport {
    /// True when no rows survived normalization and exclusion.
    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }
}

/// Converts a duration to fractional minutes.
#[allow(clippy::cast_precision_loss)]
pub fn minutes(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}

/// Records per hour of working time. Zero working time yields zero.
#[allow(clippy::cast_precision_loss)]
pub fn efficiency(record_count: usize, working: Duration) -> f64 {
    let hours = minutes(working) / 60.0;
    if hours > 0.0 {
        record_count as f64 / hours
    } else {
        0.0
    }
}

/// Shared figures of a summary row.
struct Figures {
    total_minutes: f64,
    idle_minutes: f64,
    excluded_minutes: f64,
    efficiency: f64,
    meets_target: bool,
}

impl Figures {
    fn of(metrics: &SpanMetrics, target: f64) -> Self {
        let efficiency = efficiency(metrics.record_count, metrics.working());
        Self {
            total_minutes: minutes(metrics.working()),
            idle_minutes: minutes(metrics.idle),
            excluded_minutes: minutes(metrics.excluded),
            efficiency,
            meets_target: efficiency >= target,
        }
    }
}

/// Builds the person-day, segment and idle-gap tables.
///
/// `days` must be ordered by (person, date), as [`crate::analyze`] returns them.
pub fn build_tables(
    days: &[DayAnalysis],
    config: &EngineConfig,
) -> (Vec<PersonDayRow>, Vec<SegmentRow>, Vec<IdleGapRow>) {
    let target = config.target_efficiency;
    let mut full = Vec::with_capacity(days.len());
    let mut ampm = Vec::with_capacity(days.len() * 2);
    let mut idle = Vec::new();

    for day in days {
        let figures = Figures::of(&day.totals, target);
        full.push(PersonDayRow {
            operator: day.person.clone(),
            date: day.date,
            data_entry_person: day.totals.data_entry_person.clone(),
            record_count: day.totals.record_count,
            total_minutes: figures.total_minutes,
            idle_minutes: figures.idle_minutes,
            idle_count: day.totals.idle_count,
            excluded_minutes: figures.excluded_minutes,
            first_event: day.totals.first_event,
            last_event: day.totals.last_event,
            efficiency: figures.efficiency,
            meets_target: figures.meets_target,
        });

        for segment in Segment::ALL {
            let metrics = day.segment(segment);
            if metrics.record_count == 0 {
                continue;
            }
            let figures = Figures::of(metrics, target);
            ampm.push(SegmentRow {
                operator: day.person.clone(),
                date: day.date,
                segment,
                data_entry_person: metrics.data_entry_person.clone(),
                record_count: metrics.record_count,
                total_minutes: figures.total_minutes,
                idle_minutes: figures.idle_minutes,
                idle_count: metrics.idle_count,
                excluded_minutes: figures.excluded_minutes,
                first_event: metrics.first_event,
                last_event: metrics.last_event,
                efficiency: figures.efficiency,
                meets_target: figures.meets_target,
            });
        }

        idle.extend(day.gaps.iter().map(|gap| IdleGapRow {
            operator: gap.person.clone(),
            date: gap.date,
            segment: gap.segment,
            data_entry_person: gap.data_entry_person.clone(),
            gap_start: gap.gap_start,
            gap_end: gap.gap_end,
            minutes: minutes(gap.idle),
        }));
    }

    (full, ampm, idle)
}
