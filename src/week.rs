//! Canonical week indexing
//!
//! A week identifier counts whole Monday-start UTC weeks since the anchor
//! Monday 1969-12-29 00:00 UTC (week 0). Every conversion is arithmetic on the
//! identifier alone, so a window never depends on the caller's current moment.
//!
//! ```text
//!     January 1970
//! Mo Tu We Th Fr Sa Su
//! 29 30 31  1  2  3  4   week 0 (unix epoch is the Thursday)
//!  5  6  7  8  9 10 11   week 1
//! 12 13 14 15 16 17 18   week 2
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 1000 * 60 * 60 * 24
pub const DAY_MS: i64 = 86_400_000;

/// 1000 * 60 * 60 * 24 * 7
pub const WEEK_MS: i64 = DAY_MS * 7;

/// Shifts the unix epoch (a Thursday) back to the preceding Monday.
pub const EPOCH_MONDAY_OFFSET_MS: i64 = 259_200_000;

/// Index of a Monday-aligned 7-day UTC window. Unbounded in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WeekId(i64);

impl WeekId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Previous/next week navigation.
    pub fn shift(self, delta: i64) -> Self {
        shift(self, delta)
    }

    pub fn window(self) -> Option<WeekWindow> {
        window_of(self)
    }

    pub fn contains(self, instant: DateTime<Utc>) -> bool {
        current_week_id(instant) == self
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid week id: {0:?}")]
pub struct ParseWeekIdError(String);

impl FromStr for WeekId {
    type Err = ParseWeekIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(WeekId)
            .map_err(|_| ParseWeekIdError(s.to_string()))
    }
}

impl From<i64> for WeekId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// The remote API keys weeks by their string form but some payloads carry the
// bare integer, so both are accepted on read.
impl<'de> Deserialize<'de> for WeekId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(WeekId(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Concrete bounds of a week: Monday 00:00 UTC and the Sunday six days later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl WeekWindow {
    /// Calendar days Monday through Sunday.
    pub fn days(&self) -> Vec<NaiveDate> {
        let monday = self.start_date.date_naive();
        (0..7).map(|d| monday + Duration::days(d)).collect()
    }

    /// Week selector text, e.g. `Jan 05 - Jan 11`.
    pub fn range_label(&self) -> String {
        format!(
            "{} - {}",
            self.start_date.format("%b %d"),
            self.end_date.format("%b %d")
        )
    }
}

/// Week containing `now`.
pub fn current_week_id(now: DateTime<Utc>) -> WeekId {
    let shifted = i128::from(now.timestamp_millis()) + i128::from(EPOCH_MONDAY_OFFSET_MS);
    // DateTime<Utc> millis fit comfortably in i64 after division
    WeekId(shifted.div_euclid(i128::from(WEEK_MS)) as i64)
}

/// Week containing the given UTC calendar day.
pub fn week_of_date(date: NaiveDate) -> WeekId {
    current_week_id(date.and_time(NaiveTime::MIN).and_utc())
}

/// Window denoted by `id`.
///
/// Returns `None` only when the Monday falls outside the range chrono can
/// represent (roughly ±262,000 years).
pub fn window_of(id: WeekId) -> Option<WeekWindow> {
    let start_ms = id
        .0
        .checked_mul(WEEK_MS)?
        .checked_sub(EPOCH_MONDAY_OFFSET_MS)?;
    let end_ms = start_ms.checked_add(6 * DAY_MS)?;

    Some(WeekWindow {
        start_date: DateTime::<Utc>::from_timestamp_millis(start_ms)?,
        end_date: DateTime::<Utc>::from_timestamp_millis(end_ms)?,
    })
}

/// `id + delta`, saturating at the integer limits.
pub fn shift(id: WeekId, delta: i64) -> WeekId {
    WeekId(id.0.saturating_add(delta))
}
