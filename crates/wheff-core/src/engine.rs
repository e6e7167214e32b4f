//! Engine entry points.

use crate::analysis::analyze;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineWarning};
use crate::event::WorkEvent;
use crate::exclusion::{ExclusionRule, ExclusionSet};
use crate::input::{InputTable, normalize};
use crate::report::{BatchStats, EngineReport, build_tables};

/// Runs the full analysis over a canonical input table.
///
/// Fails only on invalid configuration or missing required columns; in
/// both cases nothing is computed. Unparseable rows are skipped and counted
/// in [`BatchStats::dropped_rows`].
pub fn run(
    table: &InputTable,
    rules: &[ExclusionRule],
    config: &EngineConfig,
) -> Result<EngineReport, EngineError> {
    config.validate()?;
    let normalized = normalize(table)?;

    let mut report = analyze_batch(&normalized.events, rules, config);
    report.stats.input_rows = table.rows.len();
    report.stats.dropped_rows = normalized.issues.len();

    tracing::info!(
        input_rows = report.stats.input_rows,
        dropped_rows = report.stats.dropped_rows,
        excluded_rows = report.stats.excluded_rows,
        person_days = report.full.len(),
        idle_gaps = report.idle.len(),
        "efficiency analysis complete"
    );
    Ok(report)
}

/// Runs the analysis over events that were normalized elsewhere.
pub fn run_events(
    events: &[WorkEvent],
    rules: &[ExclusionRule],
    config: &EngineConfig,
) -> Result<EngineReport, EngineError> {
    config.validate()?;
    Ok(analyze_batch(events, rules, config))
}

fn analyze_batch(events: &[WorkEvent], rules: &[ExclusionRule], config: &EngineConfig) -> EngineReport {
    let exclusions = ExclusionSet::new(rules);
    let (excluded, kept): (Vec<&WorkEvent>, Vec<&WorkEvent>) =
        events.iter().partition(|e| exclusions.is_excluded(e));

    let days = analyze(kept.iter().copied(), &exclusions, config);
    let (full, ampm, idle) = build_tables(&days, config);

    let mut warnings = exclusions.ignored().to_vec();
    if full.is_empty() {
        tracing::warn!("no rows left to analyze after parsing and exclusion");
        warnings.push(EngineWarning::EmptyResult);
    }

    EngineReport {
        full,
        ampm,
        idle,
        target_efficiency: config.target_efficiency,
        stats: BatchStats {
            input_rows: events.len(),
            dropped_rows: 0,
            excluded_rows: excluded.len(),
            analyzed_rows: kept.len(),
            ignored_rules: exclusions.ignored().len(),
        },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;
    use chrono::{NaiveDate, NaiveTime};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn table(rows: &[(&str, &str, &str)]) -> InputTable {
        InputTable::new(
            vec![
                "operator".to_string(),
                "data_entry_person".to_string(),
                "timestamp".to_string(),
            ],
            rows.iter()
                .map(|(op, person, ts)| vec![(*op).to_string(), (*person).to_string(), (*ts).to_string()])
                .collect(),
        )
    }

    fn scenario_rows() -> InputTable {
        table(&[
            ("X", "", "2025-01-15 08:00:00"),
            ("X", "", "2025-01-15 08:05:00"),
            ("X", "", "2025-01-15 08:45:00"),
        ])
    }

    #[test]
    fn scenario_a_single_forty_minute_gap() {
        let report = run(&scenario_rows(), &[], &EngineConfig::default()).unwrap();

        assert_eq!(report.idle.len(), 1);
        let gap = &report.idle[0];
        assert_eq!(gap.operator, "X");
        assert_eq!(gap.gap_start.time(), t(8, 5));
        assert_eq!(gap.gap_end.time(), t(8, 45));
        assert!((gap.minutes - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scenario_b_exclusion_window_reduces_gap() {
        let rules = [ExclusionRule::new("", t(8, 10), t(8, 40))];
        let report = run(&scenario_rows(), &rules, &EngineConfig::default()).unwrap();

        assert_eq!(report.idle.len(), 1);
        assert!((report.idle[0].minutes - 10.0).abs() < f64::EPSILON);
        assert!((report.full[0].excluded_minutes - 30.0).abs() < f64::EPSILON);
        insta::assert_json_snapshot!(report.idle, @r#"
        [
          {
            "operator": "X",
            "date": "2025-01-15",
            "segment": "AM",
            "data_entry_person": null,
            "gap_start": "2025-01-15T08:05:00",
            "gap_end": "2025-01-15T08:45:00",
            "minutes": 10.0
          }
        ]
        "#);
    }

    #[test]
    fn scenario_c_rule_for_other_person_does_not_apply() {
        let input = table(&[
            ("X", "Bob", "2025-01-15 08:00:00"),
            ("X", "Bob", "2025-01-15 08:05:00"),
            ("X", "Bob", "2025-01-15 08:45:00"),
        ]);
        let rules = [ExclusionRule::new("Alice", t(8, 10), t(8, 40))];
        let report = run(&input, &rules, &EngineConfig::default()).unwrap();

        assert!((report.idle[0].minutes - 40.0).abs() < f64::EPSILON);
        assert!(report.full[0].excluded_minutes.abs() < f64::EPSILON);
        assert_eq!(report.stats.excluded_rows, 0);
    }

    #[test]
    fn scenario_d_noon_event_is_pm() {
        let input = table(&[("X", "", "2025-01-15 12:00:00")]);
        let report = run(&input, &[], &EngineConfig::default()).unwrap();

        assert_eq!(report.ampm.len(), 1);
        assert_eq!(report.ampm[0].segment, Segment::Pm);
    }

    #[test]
    fn scenario_e_cutoff_crossing_gap_is_am() {
        let input = table(&[
            ("X", "", "2025-01-15 11:58:00"),
            ("X", "", "2025-01-15 12:10:00"),
        ]);
        let report = run(&input, &[], &EngineConfig::default()).unwrap();

        assert_eq!(report.idle.len(), 1);
        assert_eq!(report.idle[0].segment, Segment::Am);
        let am = report.ampm.iter().find(|r| r.segment == Segment::Am).unwrap();
        let pm = report.ampm.iter().find(|r| r.segment == Segment::Pm).unwrap();
        assert!((am.idle_minutes - 12.0).abs() < f64::EPSILON);
        assert!(pm.idle_minutes.abs() < f64::EPSILON);
    }

    #[test]
    fn schema_error_aborts_without_results() {
        let input = InputTable::new(
            vec!["name".to_string(), "timestamp".to_string()],
            vec![vec!["X".to_string(), "2025-01-15 08:00".to_string()]],
        );
        let err = run(&input, &[], &EngineConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::Schema { missing: vec!["operator"] });
    }

    #[test]
    fn invalid_config_aborts() {
        let config = EngineConfig {
            idle_threshold_minutes: f64::INFINITY,
            ..EngineConfig::default()
        };
        assert!(matches!(
            run(&scenario_rows(), &[], &config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unparseable_rows_are_counted_not_fatal() {
        let input = table(&[
            ("X", "", "2025-01-15 08:00:00"),
            ("X", "", "garbage"),
            ("", "", "2025-01-15 08:10:00"),
            ("X", "", "2025-01-15 08:05:00"),
        ]);
        let report = run(&input, &[], &EngineConfig::default()).unwrap();

        assert_eq!(report.stats.input_rows, 4);
        assert_eq!(report.stats.dropped_rows, 2);
        assert_eq!(report.stats.analyzed_rows, 2);
        assert_eq!(report.full[0].record_count, 2);
    }

    #[test]
    fn matching_events_are_excluded_once() {
        let input = table(&[
            ("X", "Alice", "2025-01-15 08:00:00"),
            ("X", "Alice", "2025-01-15 12:15:00"),
            ("X", "Alice", "2025-01-15 13:00:00"),
        ]);
        let rules = [
            ExclusionRule::new("", t(12, 0), t(12, 30)),
            ExclusionRule::new("Alice", t(12, 10), t(12, 20)),
        ];
        let report = run(&input, &rules, &EngineConfig::default()).unwrap();

        assert_eq!(report.stats.excluded_rows, 1);
        assert_eq!(report.stats.analyzed_rows, 2);
        assert_eq!(report.full[0].record_count, 2);
        // 08:00 -> 13:00 is 300 minutes, 30 of them excluded.
        assert!((report.idle[0].minutes - 270.0).abs() < f64::EPSILON);
    }

    #[test]
    fn everything_excluded_is_empty_result_warning() {
        let rules = [ExclusionRule::new("", t(0, 0), t(23, 59))];
        let report = run(&scenario_rows(), &rules, &EngineConfig::default()).unwrap();

        assert!(report.is_empty());
        assert!(report.ampm.is_empty());
        assert!(report.idle.is_empty());
        assert_eq!(report.stats.excluded_rows, 3);
        assert_eq!(report.warnings, vec![EngineWarning::EmptyResult]);
    }

    #[test]
    fn malformed_rule_is_reported_and_ignored() {
        let rules = [ExclusionRule::new("", t(8, 40), t(8, 10))];
        let report = run(&scenario_rows(), &rules, &EngineConfig::default()).unwrap();

        assert_eq!(report.stats.ignored_rules, 1);
        assert!((report.idle[0].minutes - 40.0).abs() < f64::EPSILON);
        assert!(matches!(
            report.warnings[0],
            EngineWarning::IgnoredRule { index: 0, .. }
        ));
    }

    #[test]
    fn target_is_passed_through() {
        let config = EngineConfig {
            target_efficiency: 35.0,
            ..EngineConfig::default()
        };
        let report = run(&scenario_rows(), &[], &config).unwrap();
        assert!((report.target_efficiency - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rerun_is_byte_identical() {
        let input = table(&[
            ("B", "Alice", "2025-01-15 08:00:00"),
            ("A", "Bob", "2025-01-15 09:00:00"),
            ("B", "Alice", "2025-01-15 11:50:00"),
            ("A", "Bob", "2025-01-15 08:30:00"),
            ("B", "Carol", "2025-01-15 12:30:00"),
            ("A", "Bob", "2025-01-16 14:00:00"),
        ]);
        let rules = [ExclusionRule::new("", t(12, 0), t(12, 20))];
        let config = EngineConfig::default();

        let first = serde_json::to_string(&run(&input, &rules, &config).unwrap()).unwrap();
        let second = serde_json::to_string(&run(&input, &rules, &config).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn summary_rows_satisfy_invariants() {
        let input = table(&[
            ("A", "", "2025-01-15 07:55:00"),
            ("A", "", "2025-01-15 08:30:00"),
            ("A", "", "2025-01-15 11:59:00"),
            ("A", "", "2025-01-15 12:01:00"),
            ("A", "", "2025-01-15 12:40:00"),
            ("B", "", "2025-01-15 12:00:00"),
        ]);
        let rules = [ExclusionRule::new("", t(8, 0), t(8, 20))];
        let report = run(&input, &rules, &EngineConfig::default()).unwrap();

        for row in &report.full {
            assert!(row.idle_minutes >= 0.0);
            assert!(row.total_minutes >= 0.0);
            if row.total_minutes < f64::EPSILON {
                assert!(row.efficiency.abs() < f64::EPSILON);
            }
        }
        for gap in &report.idle {
            assert!(gap.minutes > 0.0);
            assert!(gap.gap_end > gap.gap_start);
        }
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let a_segments: usize = report
            .ampm
            .iter()
            .filter(|r| r.operator == "A" && r.date == day)
            .map(|r| r.record_count)
            .sum();
        assert_eq!(a_segments, 5);
    }

    #[test]
    fn typed_events_skip_normalization() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let events = vec![
            WorkEvent::new("X", None, date.and_time(t(8, 0))),
            WorkEvent::new("X", None, date.and_time(t(8, 30))),
        ];
        let report = run_events(&events, &[], &EngineConfig::default()).unwrap();

        assert_eq!(report.stats.input_rows, 2);
        assert_eq!(report.idle.len(), 1);
    }

    #[test]
    fn empty_table_is_empty_result() {
        let report = run(&table(&[]), &[], &EngineConfig::default()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.warnings, vec![EngineWarning::EmptyResult]);
    }
}
