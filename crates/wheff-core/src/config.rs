//! Engine configuration.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default gap length (minutes) above which a pause counts as idle.
pub const DEFAULT_IDLE_THRESHOLD_MINUTES: f64 = 10.0;

/// Default records-per-hour target used for highlighting.
pub const DEFAULT_TARGET_EFFICIENCY: f64 = 20.0;

/// Which event field keys a person-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// The operator who performed the work.
    #[default]
    Operator,
    /// The clerk who keyed the record. Falls back to the operator when blank.
    DataEntryPerson,
}

impl GroupBy {
    /// String representation used in configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::DataEntryPerson => "data_entry_person",
        }
    }
}

impl std::str::FromStr for GroupBy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operator" => Ok(Self::Operator),
            "data_entry_person" | "data-entry-person" => Ok(Self::DataEntryPerson),
            _ => Err(EngineError::InvalidConfig(format!("unknown grouping key: {s}"))),
        }
    }
}

/// Configuration for a single engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gaps strictly longer than this many minutes are candidates for idle time.
    /// Default: 10.
    pub idle_threshold_minutes: f64,

    /// Events strictly before this time of day are AM, the rest PM.
    /// Default: 12:00:00.
    #[serde(with = "crate::time_of_day")]
    pub am_pm_cutoff: NaiveTime,

    /// Records per hour below which a row is flagged. Passed through to consumers.
    /// Default: 20.
    pub target_efficiency: f64,

    /// Field that identifies the person in a person-day.
    pub group_by: GroupBy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_threshold_minutes: DEFAULT_IDLE_THRESHOLD_MINUTES,
            am_pm_cutoff: NaiveTime::from_hms_opt(12, 0, 0).expect("noon is a valid time"),
            target_efficiency: DEFAULT_TARGET_EFFICIENCY,
            group_by: GroupBy::Operator,
        }
    }
}

impl EngineConfig {
    /// Checks that thresholds are finite and in range.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.idle_threshold_minutes.is_finite() || self.idle_threshold_minutes < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "idle threshold must be a non-negative number of minutes, got {}",
                self.idle_threshold_minutes
            )));
        }
        if !self.target_efficiency.is_finite() || self.target_efficiency < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "target efficiency must be a non-negative number, got {}",
                self.target_efficiency
            )));
        }
        Ok(())
    }

    /// The idle threshold as a duration, rounded to the millisecond.
    #[allow(clippy::cast_possible_truncation)]
    pub fn idle_threshold(&self) -> Duration {
        Duration::milliseconds((self.idle_threshold_minutes * 60_000.0).round() as i64)
    }
}
