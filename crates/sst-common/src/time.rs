//! Time handling for anomaly datasets: parsing, time indexes and rounding.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parse an ISO 8601 timestamp, a naive datetime (assumed UTC) or a bare date.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    // Full datetime with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Without timezone (assume UTC)
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    // Date only
    if let Some(ndt) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// A closed time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }

    /// Constrain a timestamp to this range.
    pub fn clamp(&self, dt: DateTime<Utc>) -> DateTime<Utc> {
        dt.max(self.start).min(self.end)
    }
}

/// Which neighbour wins when a target sits exactly between two time steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    #[default]
    Earlier,
    Later,
}

impl FromStr for TieBreak {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "earlier" | "before" | "first" => Ok(Self::Earlier),
            "later" | "after" | "last" => Ok(Self::Later),
            other => Err(TimeParseError::UnknownOption(other.to_string())),
        }
    }
}

/// Ordered timestamps exposed by a dataset's time axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndex {
    times: Vec<DateTime<Utc>>,
}

impl TimeIndex {
    /// Build an index; the timestamps must be non-empty and strictly ascending.
    pub fn new(times: Vec<DateTime<Utc>>) -> Result<Self, TimeIndexError> {
        if times.is_empty() {
            return Err(TimeIndexError::Empty);
        }
        if let Some(pos) = times.windows(2).position(|w| w[0] >= w[1]) {
            return Err(TimeIndexError::NotAscending {
                position: pos + 1,
                time: times[pos + 1],
            });
        }
        Ok(Self { times })
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first(&self) -> DateTime<Utc> {
        self.times[0]
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.times[self.times.len() - 1]
    }

    /// Covered period `[t_min, t_max]`.
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.first(), self.last())
    }

    /// Resolve a requested time to the index of an available time step.
    ///
    /// Targets before the first step clamp to it, targets after the last step
    /// clamp to it; anything in between picks the nearest step, with
    /// `tie_break` deciding between two equidistant neighbours.
    pub fn nearest(&self, target: DateTime<Utc>, tie_break: TieBreak) -> (usize, DateTime<Utc>) {
        let last = self.times.len() - 1;
        if target <= self.times[0] {
            return (0, self.times[0]);
        }
        if target >= self.times[last] {
            return (last, self.times[last]);
        }

        // First step at or after the target; 1..=last because of the clamps above.
        let after = self.times.partition_point(|t| *t < target);
        if self.times[after] == target {
            return (after, target);
        }

        let before = after - 1;
        let to_before = target - self.times[before];
        let to_after = self.times[after] - target;

        let idx = if to_before < to_after {
            before
        } else if to_after < to_before {
            after
        } else {
            match tie_break {
                TieBreak::Earlier => before,
                TieBreak::Later => after,
            }
        };
        (idx, self.times[idx])
    }

    /// Targets that resolve to step `idx` under `tie_break`.
    pub fn window(&self, idx: usize, tie_break: TieBreak) -> StepWindow {
        let idx = idx.min(self.times.len() - 1);
        let start = idx.saturating_sub(1);
        let end = (idx + 2).min(self.times.len());

        StepWindow {
            neighbours: Self {
                times: self.times[start..end].to_vec(),
            },
            step: self.times[idx],
            tie_break,
        }
    }
}

/// The set of requested times that resolve to one time step.
///
/// Only the step and its direct neighbours are kept. A target outside the
/// neighbours is always closer to one of them than to the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepWindow {
    neighbours: TimeIndex,
    step: DateTime<Utc>,
    tie_break: TieBreak,
}

impl StepWindow {
    pub fn step(&self) -> DateTime<Utc> {
        self.step
    }

    /// Would `target` resolve to this step?
    pub fn contains(&self, target: DateTime<Utc>) -> bool {
        self.neighbours.nearest(target, self.tie_break).1 == self.step
    }
}

/// Rounding applied to requested dates to group them under one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Exact,
    Hourly,
    #[default]
    Daily,
    Monthly,
}

impl Granularity {
    /// Truncate a timestamp to the start of its period.
    pub fn truncate(&self, dt: DateTime<Utc>) -> DateTime<Utc> {
        let truncated = match self {
            Granularity::Exact => return dt,
            Granularity::Hourly => dt
                .with_nanosecond(0)
                .and_then(|d| d.with_second(0))
                .and_then(|d| d.with_minute(0)),
            Granularity::Daily => dt
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|ndt| Utc.from_utc_datetime(&ndt)),
            Granularity::Monthly => NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| Utc.from_utc_datetime(&ndt)),
        };
        truncated.unwrap_or(dt)
    }
}

impl FromStr for Granularity {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "none" => Ok(Self::Exact),
            "hourly" | "hour" => Ok(Self::Hourly),
            "daily" | "day" => Ok(Self::Daily),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(TimeParseError::UnknownOption(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TimeIndexError {
    #[error("time axis is empty")]
    Empty,

    #[error("time axis is not strictly ascending at position {position} ({time})")]
    NotAscending {
        position: usize,
        time: DateTime<Utc>,
    },
}
