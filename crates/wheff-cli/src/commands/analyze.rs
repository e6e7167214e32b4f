//! Analyze command: run the efficiency engine over one input file.
//!
//! Output is either a human-readable report with the person-day, segment and
//! idle-gap tables, or the full engine report as JSON.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use clap::Args;
use wheff_core::{EngineConfig, EngineReport, EngineWarning, ExclusionRule, GroupBy};

use crate::Config;
use crate::config::load_exclusions;
use crate::ingest::{ReportKind, read_input};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// CSV file with one row per processed record (`-` for stdin).
    pub input: PathBuf,

    /// Column layout of the input file.
    #[arg(long, value_enum)]
    pub report: Option<ReportKind>,

    /// TOML file with additional `[[exclusions]]` windows.
    #[arg(long)]
    pub exclusions: Option<PathBuf>,

    /// Output the full report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Idle threshold in minutes.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// AM/PM cutoff as HH:MM or HH:MM:SS.
    #[arg(long, value_parser = parse_cutoff)]
    pub cutoff: Option<NaiveTime>,

    /// Target records per hour.
    #[arg(long)]
    pub target: Option<f64>,

    /// Key person-days by `operator` or `data_entry_person`.
    #[arg(long)]
    pub group_by: Option<GroupBy>,
}

fn parse_cutoff(s: &str) -> Result<NaiveTime, String> {
    wheff_core::time_of_day::parse(s).ok_or_else(|| format!("invalid time of day: {s}"))
}

impl AnalyzeArgs {
    /// Applies command-line overrides on top of the loaded engine config.
    pub fn engine_config(&self, base: &EngineConfig) -> EngineConfig {
        EngineConfig {
            idle_threshold_minutes: self.threshold.unwrap_or(base.idle_threshold_minutes),
            am_pm_cutoff: self.cutoff.unwrap_or(base.am_pm_cutoff),
            target_efficiency: self.target.unwrap_or(base.target_efficiency),
            group_by: self.group_by.unwrap_or(base.group_by),
        }
    }
}

pub fn run(args: &AnalyzeArgs, config: &Config) -> Result<()> {
    let kind = args.report.unwrap_or(config.report);
    let engine = args.engine_config(&config.engine);

    let mut rules: Vec<ExclusionRule> = config.exclusions.clone();
    if let Some(path) = &args.exclusions {
        rules.extend(load_exclusions(path)?);
    }
    tracing::debug!(rules = rules.len(), ?engine, "running analysis");

    let table = read_input(&args.input, kind)?;
    let report = wheff_core::run(&table, &rules, &engine)
        .with_context(|| format!("cannot analyze {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report, kind, &engine));
    }
    Ok(())
}

// ========== Formatting ==========

/// Formats fractional minutes as "Xh Ym" if >= 1 hour, "Ym" otherwise.
/// Negative and non-finite values are treated as 0m.
#[allow(clippy::cast_possible_truncation)]
pub fn format_minutes(minutes: f64) -> String {
    if !minutes.is_finite() || minutes <= 0.0 {
        return "0m".to_string();
    }
    let total = minutes.round() as i64;
    let hours = total / 60;
    let mins = total % 60;

    if hours >= 1 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

const fn target_mark(meets_target: bool) -> char {
    if meets_target { ' ' } else { '*' }
}

fn write_section(output: &mut String, title: &str) {
    writeln!(output).unwrap();
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();
}

fn describe_warning(warning: &EngineWarning) -> Option<String> {
    match warning {
        EngineWarning::IgnoredRule {
            index,
            start_time,
            end_time,
        } => Some(format!(
            "exclusion rule #{} ({start_time}-{end_time}) ends before it starts and was ignored",
            index + 1
        )),
        EngineWarning::EmptyResult => None,
    }
}

/// Formats the human-readable report output.
pub fn format_report(report: &EngineReport, kind: ReportKind, config: &EngineConfig) -> String {
    let mut output = String::new();
    let stats = &report.stats;

    writeln!(output, "EFFICIENCY REPORT: {}", kind.as_str()).unwrap();
    writeln!(
        output,
        "Target: {:.1} records/h   Idle threshold: {} min   Cutoff: {}",
        report.target_efficiency,
        config.idle_threshold_minutes,
        config.am_pm_cutoff.format("%H:%M")
    )
    .unwrap();

    for message in report.warnings.iter().filter_map(describe_warning) {
        writeln!(output, "Warning: {message}").unwrap();
    }

    if report.is_empty() {
        writeln!(output).unwrap();
        writeln!(
            output,
            "No rows left to analyze ({} read, {} dropped, {} excluded).",
            stats.input_rows, stats.dropped_rows, stats.excluded_rows
        )
        .unwrap();
        return output;
    }

    write_section(&mut output, "BY PERSON-DAY");
    writeln!(
        output,
        "  {:<16} {:<10}  {:>7}  {:>7}  {:>7}  {:>4}  {:>5}",
        "OPERATOR", "DATE", "RECORDS", "WORKING", "IDLE", "GAPS", "RATE"
    )
    .unwrap();
    for row in &report.full {
        writeln!(
            output,
            "{} {:<16} {}  {:>7}  {:>7}  {:>7}  {:>4}  {:>5.1}",
            target_mark(row.meets_target),
            row.operator,
            row.date,
            row.record_count,
            format_minutes(row.total_minutes),
            format_minutes(row.idle_minutes),
            row.idle_count,
            row.efficiency
        )
        .unwrap();
    }

    write_section(&mut output, "BY SEGMENT");
    writeln!(
        output,
        "  {:<16} {:<10}  {:<3}  {:>7}  {:>7}  {:>7}  {:>4}  {:>5}",
        "OPERATOR", "DATE", "SEG", "RECORDS", "WORKING", "IDLE", "GAPS", "RATE"
    )
    .unwrap();
    for row in &report.ampm {
        writeln!(
            output,
            "{} {:<16} {}  {:<3}  {:>7}  {:>7}  {:>7}  {:>4}  {:>5.1}",
            target_mark(row.meets_target),
            row.operator,
            row.date,
            row.segment.as_str(),
            row.record_count,
            format_minutes(row.total_minutes),
            format_minutes(row.idle_minutes),
            row.idle_count,
            row.efficiency
        )
        .unwrap();
    }

    write_section(&mut output, "IDLE GAPS");
    if report.idle.is_empty() {
        writeln!(output, "  (none)").unwrap();
    } else {
        writeln!(
            output,
            "  {:<16} {:<10}  {:<3}  {:<8}  {:<8}  {:>7}",
            "OPERATOR", "DATE", "SEG", "FROM", "TO", "IDLE"
        )
        .unwrap();
        for gap in &report.idle {
            writeln!(
                output,
                "  {:<16} {}  {:<3}  {}  {}  {:>7}",
                gap.operator,
                gap.date,
                gap.segment.as_str(),
                gap.gap_start.format("%H:%M:%S"),
                gap.gap_end.format("%H:%M:%S"),
                format_minutes(gap.minutes)
            )
            .unwrap();
        }
    }

    let below_target = report.full.iter().filter(|r| !r.meets_target).count();
    write_section(&mut output, "SUMMARY");
    writeln!(
        output,
        "  Rows: {} read, {} dropped, {} excluded, {} analyzed",
        stats.input_rows, stats.dropped_rows, stats.excluded_rows, stats.analyzed_rows
    )
    .unwrap();
    writeln!(
        output,
        "  Below target (*): {below_target} of {} person-days",
        report.full.len()
    )
    .unwrap();

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use wheff_core::InputTable;

    fn table(rows: &[(&str, &str)]) -> InputTable {
        InputTable::new(
            vec!["operator".to_string(), "timestamp".to_string()],
            rows.iter()
                .map(|(op, ts)| vec![(*op).to_string(), (*ts).to_string()])
                .collect(),
        )
    }

    fn analyze(rows: &[(&str, &str)], rules: &[ExclusionRule]) -> EngineReport {
        wheff_core::run(&table(rows), rules, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0.0), "0m");
        assert_eq!(format_minutes(-3.0), "0m");
        assert_eq!(format_minutes(f64::NAN), "0m");
        assert_eq!(format_minutes(5.0), "5m");
        assert_eq!(format_minutes(59.6), "1h 0m");
        assert_eq!(format_minutes(125.0), "2h 5m");
    }

    #[test]
    fn test_cutoff_parser() {
        assert_eq!(parse_cutoff("13:30"), Ok(NaiveTime::from_hms_opt(13, 30, 0).unwrap()));
        assert!(parse_cutoff("half past one").is_err());
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let args = AnalyzeArgs {
            input: PathBuf::from("-"),
            report: None,
            exclusions: None,
            json: false,
            threshold: Some(5.0),
            cutoff: None,
            target: None,
            group_by: Some(GroupBy::DataEntryPerson),
        };
        let base = EngineConfig {
            target_efficiency: 30.0,
            ..EngineConfig::default()
        };
        let merged = args.engine_config(&base);

        assert!((merged.idle_threshold_minutes - 5.0).abs() < f64::EPSILON);
        assert!((merged.target_efficiency - 30.0).abs() < f64::EPSILON);
        assert_eq!(merged.am_pm_cutoff, base.am_pm_cutoff);
        assert_eq!(merged.group_by, GroupBy::DataEntryPerson);
    }

    #[test]
    fn test_report_single_gap() {
        let report = analyze(
            &[
                ("X", "2025-01-15 08:00:00"),
                ("X", "2025-01-15 08:05:00"),
                ("X", "2025-01-15 08:45:00"),
            ],
            &[],
        );
        let output = format_report(&report, ReportKind::Picking, &EngineConfig::default());

        assert_snapshot!(output, @r"
        EFFICIENCY REPORT: picking
        Target: 20.0 records/h   Idle threshold: 10 min   Cutoff: 12:00

        BY PERSON-DAY
        ─────────────
          OPERATOR         DATE        RECORDS  WORKING     IDLE  GAPS   RATE
          X                2025-01-15        3       5m      40m     1   36.0

        BY SEGMENT
        ──────────
          OPERATOR         DATE        SEG  RECORDS  WORKING     IDLE  GAPS   RATE
          X                2025-01-15  AM         3       5m      40m     1   36.0

        IDLE GAPS
        ─────────
          OPERATOR         DATE        SEG  FROM      TO           IDLE
          X                2025-01-15  AM   08:05:00  08:45:00      40m

        SUMMARY
        ───────
          Rows: 3 read, 0 dropped, 0 excluded, 3 analyzed
          Below target (*): 0 of 1 person-days
        ");
    }

    #[test]
    fn test_report_marks_rows_below_target() {
        let report = analyze(
            &[
                ("Slow", "2025-01-15 08:00:00"),
                ("Slow", "2025-01-15 08:09:00"),
                ("Slow", "2025-01-15 08:18:00"),
            ],
            &[],
        );
        let output = format_report(&report, ReportKind::Generic, &EngineConfig::default());

        // 3 records over 18 minutes is 10 per hour.
        assert!(output.contains("* Slow "));
        assert!(output.contains("   10.0\n"));
        assert!(output.contains("  (none)"));
        assert!(output.contains("Below target (*): 1 of 1 person-days"));
    }

    #[test]
    fn test_report_empty_result() {
        let rules = [ExclusionRule::new(
            "",
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        )];
        let report = analyze(&[("X", "2025-01-15 08:00:00"), ("X", "bad")], &rules);
        let output = format_report(&report, ReportKind::Generic, &EngineConfig::default());

        assert!(output.ends_with("No rows left to analyze (2 read, 1 dropped, 1 excluded).\n"));
        assert!(!output.contains("BY PERSON-DAY"));
    }

    #[test]
    fn test_report_lists_ignored_rules() {
        let rules = [ExclusionRule::new(
            "",
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        )];
        let report = analyze(&[("X", "2025-01-15 08:00:00")], &rules);
        let output = format_report(&report, ReportKind::Generic, &EngineConfig::default());

        assert!(output.contains(
            "Warning: exclusion rule #1 (13:00:00-12:00:00) ends before it starts and was ignored"
        ));
    }
}
