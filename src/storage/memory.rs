/// In-memory log store
///
/// Useful for offline runs and for exercising the cache's failure handling:
/// fetches and saves can each be made to fail, and fetches can be slowed
/// down to keep a load in flight.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DateKey, DateRange, HabitId, LogEntry};
use crate::storage::{LogStore, StorageError};

#[derive(Debug, Default)]
pub struct MemoryLogStore {
    rows: Mutex<HashMap<HabitId, BTreeMap<DateKey, LogEntry>>>,
    fail_fetches: AtomicBool,
    fail_saves: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    fetch_count: AtomicU32,
    save_count: AtomicU32,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly, bypassing the save counters
    pub fn insert(&self, habit_id: &HabitId, entry: LogEntry) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.entry(habit_id.clone()).or_default().insert(entry.date, entry);
    }

    /// All stored entries of a habit, oldest first
    pub fn entries(&self, habit_id: &HabitId) -> Vec<LogEntry> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.get(habit_id)
            .map(|days| days.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Delay every fetch by `delay` before it answers
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *self.fetch_delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    /// Number of fetches attempted so far, failed ones included
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Number of saves attempted so far, failed ones included
    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn fetch_logs(
        &self,
        habit_id: &HabitId,
        range: DateRange,
    ) -> Result<Vec<LogEntry>, StorageError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("log fetch rejected".to_string()));
        }

        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .get(habit_id)
            .map(|days| {
                days.range(range.from..=range.to)
                    .map(|(_, entry)| entry.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_log(&self, habit_id: &HabitId, entry: LogEntry) -> Result<(), StorageError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("log save rejected".to_string()));
        }

        entry.validate()?;
        self.insert(habit_id, entry);
        Ok(())
    }
}
