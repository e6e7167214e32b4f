//! Exclusion rules: daily time windows removed from idle and working time.
//!
//! A rule covers the same wall-clock window on every calendar day. It can be
//! restricted to one data-entry person; an empty filter applies to everyone.
//!
//! Two queries are answered here:
//! - whether a single event falls inside an applicable window
//! - how much of an interval is covered by the union of applicable windows

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::EngineWarning;
use crate::event::WorkEvent;

/// A daily window to exclude, optionally restricted to one data-entry person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Data-entry person this rule applies to. Empty applies to everyone.
    #[serde(default)]
    pub operator_filter: String,

    /// Start of the window (inclusive).
    #[serde(with = "crate::time_of_day")]
    pub start_time: NaiveTime,

    /// End of the window (inclusive for event matching).
    #[serde(with = "crate::time_of_day")]
    pub end_time: NaiveTime,
}

impl ExclusionRule {
    pub fn new(operator_filter: impl Into<String>, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            operator_filter: operator_filter.into(),
            start_time,
            end_time,
        }
    }

    /// Rules ending before they start are treated as empty.
    pub fn is_well_formed(&self) -> bool {
        self.start_time <= self.end_time
    }

    /// Whether this rule applies to the given data-entry person.
    pub fn applies_to(&self, person: Option<&str>) -> bool {
        let filter = self.operator_filter.trim();
        filter.is_empty() || person.is_some_and(|p| p.trim() == filter)
    }

    /// Whether the time of day lies within `[start_time, end_time]`.
    pub fn covers(&self, time: NaiveTime) -> bool {
        self.is_well_formed() && self.start_time <= time && time <= self.end_time
    }

    /// Whether the event falls inside this rule.
    pub fn matches(&self, event: &WorkEvent) -> bool {
        self.covers(event.time_of_day()) && self.applies_to(event.data_entry_person())
    }
}

/// An interval of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// The validated rule set for one engine run.
///
/// Malformed rules are set aside at construction and never consulted.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    rules: Vec<ExclusionRule>,
    ignored: Vec<EngineWarning>,
}

impl ExclusionSet {
    /// Builds the set, ignoring (and logging) rules that end before they start.
    pub fn new(rules: &[ExclusionRule]) -> Self {
        let mut valid = Vec::with_capacity(rules.len());
        let mut ignored = Vec::new();

        for (index, rule) in rules.iter().enumerate() {
            if rule.is_well_formed() {
                valid.push(rule.clone());
            } else {
                tracing::warn!(
                    index,
                    start = %rule.start_time,
                    end = %rule.end_time,
                    "ignoring exclusion rule that ends before it starts"
                );
                ignored.push(EngineWarning::IgnoredRule {
                    index,
                    start_time: rule.start_time,
                    end_time: rule.end_time,
                });
            }
        }

        Self {
            rules: valid,
            ignored,
        }
    }

    /// Rules that will be applied.
    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// Warnings for rules that were set aside.
    pub fn ignored(&self) -> &[EngineWarning] {
        &self.ignored
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule matches the event. Several matching rules still exclude it once.
    pub fn is_excluded(&self, event: &WorkEvent) -> bool {
        self.rules.iter().any(|rule| rule.matches(event))
    }

    /// Duration of `[start, end)` covered by the union of rules applicable to `person`.
    ///
    /// Each rule is projected onto every calendar day the interval touches, so
    /// overlapping rules are counted once.
    pub fn overlap(&self, start: NaiveDateTime, end: NaiveDateTime, person: Option<&str>) -> Duration {
        if end <= start || self.rules.is_empty() {
            return Duration::zero();
        }

        let mut windows = Vec::new();
        let mut day = start.date();
        loop {
            for rule in self.rules.iter().filter(|r| r.applies_to(person)) {
                let clipped = Interval {
                    start: day.and_time(rule.start_time).max(start),
                    end: day.and_time(rule.end_time).min(end),
                };
                if clipped.end > clipped.start {
                    windows.push(clipped);
                }
            }

            if day >= end.date() {
                break;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        union_duration(windows)
    }
}

/// Total length of the union of intervals.
fn union_duration(mut intervals: Vec<Interval>) -> Duration {
    if intervals.is_empty() {
        return Duration::zero();
    }
    intervals.sort_by_key(|i| i.start);

    let mut merged: Vec<Interval> = Vec::new();
    for interval in intervals {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
            } else {
                merged.push(interval);
            }
        } else {
            merged.push(interval);
        }
    }

    merged
        .iter()
        .map(Interval::duration)
        .fold(Duration::zero(), |acc, d| acc + d)
}
