//! Gap and segment analysis per person-day.
//!
//! # Algorithm Summary
//!
//! 1. Group events by (person, date) and sort each group by timestamp
//! 2. Walk consecutive event pairs; every pair contributes its duration to
//!    the span and its exclusion-window overlap to excluded time
//! 3. Pairs longer than the idle threshold become idle gaps, net of overlap
//! 4. Each pair is attributed to the segment of its starting event, so a gap
//!    crossing the AM/PM cutoff is never split

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::EngineConfig;
use crate::event::WorkEvent;
use crate::exclusion::ExclusionSet;
use crate::segment::Segment;

/// Counters for a person-day or one of its segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanMetrics {
    /// Number of events counted.
    pub record_count: usize,

    /// Sum of the durations of pairs starting here.
    pub span: Duration,

    /// Idle time net of exclusion overlap.
    pub idle: Duration,

    /// Number of idle gaps.
    pub idle_count: usize,

    /// Time covered by applicable exclusion windows.
    pub excluded: Duration,

    /// Earliest event counted.
    pub first_event: Option<NaiveDateTime>,

    /// Latest event counted.
    pub last_event: Option<NaiveDateTime>,

    /// Most frequent data-entry person among the events counted.
    pub data_entry_person: Option<String>,
}

impl SpanMetrics {
    /// Span minus idle and excluded time, never negative.
    pub fn working(&self) -> Duration {
        (self.span - self.idle - self.excluded).max(Duration::zero())
    }

    fn record(&mut self, timestamp: NaiveDateTime) {
        self.record_count += 1;
        self.first_event = Some(self.first_event.map_or(timestamp, |t| t.min(timestamp)));
        self.last_event = Some(self.last_event.map_or(timestamp, |t| t.max(timestamp)));
    }
}

/// An idle period between two consecutive events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleGap {
    pub person: String,
    pub date: NaiveDate,
    /// Segment of the gap's starting event.
    pub segment: Segment,
    /// Data-entry person of the starting event, whose rules were applied.
    pub data_entry_person: Option<String>,
    pub gap_start: NaiveDateTime,
    pub gap_end: NaiveDateTime,
    /// Gap length minus excluded overlap. Always positive.
    pub idle: Duration,
}

/// Analysis of one person-day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAnalysis {
    pub person: String,
    pub date: NaiveDate,
    pub totals: SpanMetrics,
    /// Per-segment metrics, indexed by [`Segment::index`].
    pub segments: [SpanMetrics; 2],
    /// Idle gaps in chronological order.
    pub gaps: Vec<IdleGap>,
}

impl DayAnalysis {
    pub fn segment(&self, segment: Segment) -> &SpanMetrics {
        &self.segments[segment.index()]
    }
}

/// Analyzes every person-day in the batch.
///
/// Events should already have exclusion-matched records removed. The result
/// is ordered by (person, date); within a day, events with equal timestamps
/// keep their input order.
pub fn analyze<'a>(
    events: impl IntoIterator<Item = &'a WorkEvent>,
    rules: &ExclusionSet,
    config: &EngineConfig,
) -> Vec<DayAnalysis> {
    let mut days: BTreeMap<(&str, NaiveDate), Vec<&WorkEvent>> = BTreeMap::new();
    for event in events {
        days.entry((event.person(config.group_by), event.date))
            .or_default()
            .push(event);
    }

    days.into_iter()
        .map(|((person, date), mut day_events)| {
            day_events.sort_by_key(|e| e.timestamp);
            analyze_day(person, date, &day_events, rules, config)
        })
        .collect()
}

/// Analyzes one person-day. `events` must be sorted by timestamp.
fn analyze_day(
    person: &str,
    date: NaiveDate,
    events: &[&WorkEvent],
    rules: &ExclusionSet,
    config: &EngineConfig,
) -> DayAnalysis {
    let threshold = config.idle_threshold();
    let cutoff = config.am_pm_cutoff;

    let mut totals = SpanMetrics::default();
    let mut segments = [SpanMetrics::default(), SpanMetrics::default()];
    let mut gaps = Vec::new();

    for event in events {
        let segment = Segment::of(event.time_of_day(), cutoff);
        totals.record(event.timestamp);
        segments[segment.index()].record(event.timestamp);
    }

    totals.data_entry_person = representative_person(events.iter().copied());
    for segment in Segment::ALL {
        segments[segment.index()].data_entry_person = representative_person(
            events
                .iter()
                .copied()
                .filter(|e| Segment::of(e.time_of_day(), cutoff) == segment),
        );
    }

    for pair in events.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let segment = Segment::of(from.time_of_day(), cutoff);
        let gap = to.timestamp - from.timestamp;
        let excluded = rules.overlap(from.timestamp, to.timestamp, from.data_entry_person());

        let bucket = &mut segments[segment.index()];
        totals.span += gap;
        bucket.span += gap;
        totals.excluded += excluded;
        bucket.excluded += excluded;

        if gap <= threshold {
            continue;
        }
        let idle = gap - excluded;
        if idle <= Duration::zero() {
            continue;
        }

        totals.idle += idle;
        totals.idle_count += 1;
        bucket.idle += idle;
        bucket.idle_count += 1;
        gaps.push(IdleGap {
            person: person.to_string(),
            date,
            segment,
            data_entry_person: from.data_entry_person.clone(),
            gap_start: from.timestamp,
            gap_end: to.timestamp,
            idle,
        });
    }

    tracing::debug!(
        person,
        %date,
        records = totals.record_count,
        idle_gaps = totals.idle_count,
        working_minutes = totals.working().num_minutes(),
        "analyzed person-day"
    );

    DayAnalysis {
        person: person.to_string(),
        date,
        totals,
        segments,
        gaps,
    }
}

/// Most frequent data-entry person; ties go to the alphabetically first name.
fn representative_person<'a>(events: impl Iterator<Item = &'a WorkEvent>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for person in events.filter_map(WorkEvent::data_entry_person) {
        *counts.entry(person).or_default() += 1;
    }

    counts
        .into_iter()
        .fold(None::<(&str, usize)>, |best, (name, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((name, count)),
        })
        .map(|(name, _)| name.to_string())
}
