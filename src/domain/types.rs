/// Core types and enums used throughout the domain layer
///
/// This module defines the identifiers, calendar keys and completion states
/// that the cache, the log stores and the tool layer all share.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Format used for every date key, both in storage and on the wire
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Identifier for a habit
///
/// Habit ids are issued by the backend and treated as opaque strings here.
/// They are only ever compared and used as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Parse a habit id coming from untrusted input
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitId(
                "Habit ID cannot be empty".to_string()
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HabitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HabitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A calendar day in the user's local time zone
///
/// Rendered as `YYYY-MM-DD`. Keys always come from the local wall clock,
/// never from UTC, so that "today" matches the user's own day boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a key from year/month/day, returning None for impossible dates
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The key `days` calendar days earlier
    pub fn days_before(&self, days: u32) -> Self {
        Self(self.0 - chrono::Duration::days(days as i64))
    }

    /// The key `days` calendar days later
    pub fn days_after(&self, days: u32) -> Self {
        Self(self.0 + chrono::Duration::days(days as i64))
    }

    /// The day before this one
    pub fn previous(&self) -> Self {
        self.days_before(1)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| DomainError::InvalidDate(
                format!("Expected a YYYY-MM-DD date, got '{}'", s)
            ))
    }
}

/// Completion state of a habit on a single day
///
/// `Incomplete` is the implicit state of every day that has no record,
/// so caches never need to store it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    /// Nothing recorded for the day
    #[default]
    Incomplete,
    /// The habit was done
    Completed,
    /// The user deliberately skipped the day
    Skipped,
}

impl CompletionStatus {
    /// The status a toggle moves to: incomplete -> completed -> skipped -> incomplete
    pub fn next(self) -> Self {
        match self {
            CompletionStatus::Incomplete => CompletionStatus::Completed,
            CompletionStatus::Completed => CompletionStatus::Skipped,
            CompletionStatus::Skipped => CompletionStatus::Incomplete,
        }
    }

    /// Lowercase name as used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Incomplete => "incomplete",
            CompletionStatus::Completed => "completed",
            CompletionStatus::Skipped => "skipped",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionStatus::Completed)
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "incomplete" => Ok(CompletionStatus::Incomplete),
            "completed" => Ok(CompletionStatus::Completed),
            "skipped" => Ok(CompletionStatus::Skipped),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// Inclusive range of days used when fetching logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateKey,
    pub to: DateKey,
}

impl DateRange {
    pub fn new(from: DateKey, to: DateKey) -> Self {
        Self { from, to }
    }

    /// The window `[today - days, today]`
    pub fn ending_at(today: DateKey, days: u32) -> Self {
        Self {
            from: today.days_before(days),
            to: today,
        }
    }

    pub fn contains(&self, date: DateKey) -> bool {
        date >= self.from && date <= self.to
    }
}
