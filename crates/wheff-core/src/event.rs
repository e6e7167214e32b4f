//! Work events - one processed record in the warehouse log.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::GroupBy;

/// A single timestamped unit of work.
///
/// Events are created fresh from each input batch and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkEvent {
    /// The operator who performed the work.
    pub operator: String,

    /// The clerk who keyed the record, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_entry_person: Option<String>,

    /// Wall-clock time of the event in the warehouse's local time.
    pub timestamp: NaiveDateTime,

    /// Calendar date the event is reported under.
    pub date: NaiveDate,
}

impl WorkEvent {
    /// Creates an event dated by its own timestamp.
    pub fn new(
        operator: impl Into<String>,
        data_entry_person: Option<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            operator: operator.into(),
            data_entry_person: data_entry_person.filter(|p| !p.trim().is_empty()),
            timestamp,
            date: timestamp.date(),
        }
    }

    /// Overrides the reporting date (e.g. from an explicit work-date column).
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Time of day of the event.
    pub fn time_of_day(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// The data-entry person as a string slice.
    pub fn data_entry_person(&self) -> Option<&str> {
        self.data_entry_person.as_deref()
    }

    /// The person this event is attributed to under the given grouping.
    pub fn person(&self, group_by: GroupBy) -> &str {
        match group_by {
            GroupBy::Operator => &self.operator,
            GroupBy::DataEntryPerson => self.data_entry_person().unwrap_or(&self.operator),
        }
    }
}
