/// Log entries exchanged with the log store
///
/// A LogEntry is one day's recorded status for a habit. The cache keeps the
/// same information in a compact per-habit map (HabitLog).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{CompletionStatus, DateKey, DomainError};

/// Maximum length of a note attached to a log entry
pub const MAX_NOTE_LENGTH: usize = 500;

/// Per-habit map of day -> status, holding only non-incomplete days
pub type HabitLog = BTreeMap<DateKey, CompletionStatus>;

/// One day's recorded status for a habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Which day this status is for
    pub date: DateKey,
    /// Recorded status
    pub status: CompletionStatus,
    /// Optional free-text note
    #[serde(default)]
    pub note: Option<String>,
}

impl LogEntry {
    pub fn new(date: DateKey, status: CompletionStatus) -> Self {
        Self {
            date,
            status,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Validate the entry before it is written to a store
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(note) = &self.note {
            if note.chars().count() > MAX_NOTE_LENGTH {
                return Err(DomainError::InvalidValue {
                    message: format!("Notes cannot be longer than {} characters", MAX_NOTE_LENGTH),
                });
            }
        }
        Ok(())
    }

    /// Check if this entry has a non-blank note
    pub fn has_note(&self) -> bool {
        self.note.as_deref().map_or(false, |n| !n.trim().is_empty())
    }
}

/// Re-index a list of entries into a HabitLog
///
/// Input order does not matter; if a date appears more than once the last
/// entry wins. Incomplete entries are dropped since they are the default.
pub fn index_entries<I>(entries: I) -> HabitLog
where
    I: IntoIterator<Item = LogEntry>,
{
    let mut log = HabitLog::new();
    for entry in entries {
        match entry.status {
            CompletionStatus::Incomplete => {
                log.remove(&entry.date);
            }
            status => {
                log.insert(entry.date, status);
            }
        }
    }
    log
}
