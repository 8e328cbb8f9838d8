//! Week and shift records exchanged with the remote API.
//!
//! Wire payloads are decoded into these explicit shapes on receipt; anything
//! that does not fit is rejected as a malformed response instead of being
//! coerced.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::week::WeekId;

// ============================================================================
// Shifts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftId(String);

impl ShiftId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShiftId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A single shift row of a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub name: String,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    pub is_published: bool,
}

/// `HH:MM` or `HH:MM:SS` on read; `HH:MM` (or `HH:MM:SS` when seconds are set) on write.
mod clock_time {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        let text = if time.second() == 0 {
            time.format("%H:%M").to_string()
        } else {
            time.format("%H:%M:%S").to_string()
        };
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|_| serde::de::Error::custom(format!("invalid clock time {raw:?}")))
    }
}

// ============================================================================
// Weeks
// ============================================================================

/// A week as held by the server: publication state plus its ordered shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub id: WeekId,
    pub is_published: bool,
    // Nullable, but the key itself is required
    #[serde(deserialize_with = "Option::deserialize")]
    pub published_at: Option<DateTime<Utc>>,
    pub shifts: Vec<Shift>,
}

/// Publication fields of the week being viewed.
///
/// `is_published`/`published_at` are `None` until the week's fetch resolves,
/// so a previous week's badge is never shown against a new identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekLite {
    pub id: WeekId,
    pub is_published: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
}

impl WeekLite {
    pub fn pending(id: WeekId) -> Self {
        Self {
            id,
            is_published: None,
            published_at: None,
        }
    }
}

/// Body of `POST /weeks/upsert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishWeekPayload {
    pub id: String,
    pub is_published: bool,
    pub published_at: DateTime<Utc>,
}

impl PublishWeekPayload {
    pub fn new(id: WeekId, published_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            is_published: true,
            published_at,
        }
    }
}

/// Publish response: the server's view of the week after publishing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedWeek {
    pub is_published: bool,
    #[serde(deserialize_with = "Option::deserialize")]
    pub published_at: Option<DateTime<Utc>>,
    pub shifts: Vec<Shift>,
}

/// Every API response wraps its payload in `results`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub results: T,
}

/// Error body shape: `{ "message": "..." }`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
