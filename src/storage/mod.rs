/// Storage layer for completion data
///
/// Two kinds of store back the cache: a LogStore that holds the authoritative
/// per-day statuses, and a LocalStore of string blobs that lets the cache
/// survive restarts.

pub mod local;
pub mod memory;
pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use local::*;
pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DateRange, DomainError, HabitId, LogEntry};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log entry: {0}")]
    InvalidEntry(#[from] DomainError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Store holding the authoritative daily statuses of every habit
///
/// The cache only ever reads a window of days and upserts single days.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Fetch the entries of a habit within an inclusive range, in any order
    async fn fetch_logs(
        &self,
        habit_id: &HabitId,
        range: DateRange,
    ) -> Result<Vec<LogEntry>, StorageError>;

    /// Insert or replace a single day's entry
    async fn save_log(&self, habit_id: &HabitId, entry: LogEntry) -> Result<(), StorageError>;
}

/// Key-value string storage that survives restarts
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
