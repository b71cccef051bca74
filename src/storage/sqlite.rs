/// SQLite implementation of the log store
///
/// This module provides the concrete SQLite LogStore. It handles the SQL
/// queries and the conversion between rows and LogEntry values.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::domain::{CompletionStatus, DateKey, DateRange, HabitId, LogEntry};
use crate::storage::{migrations, LogStore, StorageError};

/// SQLite-based log store
///
/// The connection is guarded by a mutex so the store can be shared between
/// the cache's spawned load and save tasks.
pub struct SqliteLogStore {
    conn: Mutex<Connection>,
}

impl SqliteLogStore {
    /// Open (or create) a log store at the given path
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        tracing::info!("SQLite log store initialized at: {:?}", db_path);

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open a log store that lives only in memory
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Connection lock poisoned".to_string()))
    }

    /// Number of rows stored for a habit (any status)
    pub fn count_logs(&self, habit_id: &HabitId) -> Result<u32, StorageError> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM habit_logs WHERE habit_id = ?1",
            params![habit_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
        let date_str: String = row.get(0)?;
        let date = date_str.parse::<DateKey>().map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "Invalid date".to_string(), rusqlite::types::Type::Text)
        })?;

        let status_str: String = row.get(1)?;
        let status = status_str.parse::<CompletionStatus>().map_err(|_| {
            rusqlite::Error::InvalidColumnType(1, "Invalid status".to_string(), rusqlite::types::Type::Text)
        })?;

        Ok(LogEntry {
            date,
            status,
            note: row.get(2)?,
        })
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    /// Get the entries of a habit within an inclusive date range
    async fn fetch_logs(
        &self,
        habit_id: &HabitId,
        range: DateRange,
    ) -> Result<Vec<LogEntry>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT log_date, status, note
             FROM habit_logs
             WHERE habit_id = ?1 AND log_date BETWEEN ?2 AND ?3
             ORDER BY log_date ASC",
        )?;

        let entry_iter = stmt.query_map(
            params![habit_id.as_str(), range.from.to_string(), range.to.to_string()],
            Self::row_to_entry,
        )?;

        let mut entries = Vec::new();
        for entry in entry_iter {
            entries.push(entry?);
        }

        tracing::debug!(
            "Fetched {} log entries for habit {} ({} to {})",
            entries.len(),
            habit_id,
            range.from,
            range.to
        );
        Ok(entries)
    }

    /// Upsert a single day's entry
    async fn save_log(&self, habit_id: &HabitId, entry: LogEntry) -> Result<(), StorageError> {
        entry.validate()?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO habit_logs (habit_id, log_date, status, note, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (habit_id, log_date) DO UPDATE SET
                status = excluded.status,
                note = excluded.note,
                updated_at = excluded.updated_at",
            params![
                habit_id.as_str(),
                entry.date.to_string(),
                entry.status.as_str(),
                entry.note,
                Utc::now()
            ],
        )?;

        tracing::debug!("Saved log for habit {} on {}: {}", habit_id, entry.date, entry.status);
        Ok(())
    }
}
