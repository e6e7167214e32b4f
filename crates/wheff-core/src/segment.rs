//! AM/PM segments of the working day.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Half of the working day, split at a configurable cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl Segment {
    /// Both segments in reporting order.
    pub const ALL: [Self; 2] = [Self::Am, Self::Pm];

    /// Classifies a time of day. The cutoff instant itself is PM.
    pub fn of(time: NaiveTime, cutoff: NaiveTime) -> Self {
        if time < cutoff { Self::Am } else { Self::Pm }
    }

    /// Position in [`Segment::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Am => 0,
            Self::Pm => 1,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
