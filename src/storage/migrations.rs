/// Database migration management
///
/// This module handles creating and updating the SQLite schema of the log
/// store. It ensures the database has all the required tables and indexes.

use rusqlite::Connection;
use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// This creates all required tables and indexes if they don't exist.
/// It also sets up the version tracking for future migrations.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

/// Get the current database schema version
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .unwrap_or(0); // No version row yet means a fresh database

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: one row per habit and day
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS habit_logs (
            habit_id TEXT NOT NULL,
            log_date TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('incomplete', 'completed', 'skipped')),
            note TEXT,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (habit_id, log_date)
        )",
        [],
    )
    .map_err(|e| StorageError::Migration(format!("Failed to create habit_logs: {}", e)))?;

    // Range scans by date across habits (retention jobs, reporting)
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_habit_logs_date
         ON habit_logs (log_date)",
        [],
    )?;

    tracing::info!("Applied migration v1: Created habit_logs schema");
    Ok(())
}
