/// Basic integration tests
use habit_completion_cache::*;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    fn today() -> DateKey {
        DateKey::from_ymd(2024, 6, 1).unwrap()
    }

    fn cache_on_disk(db: &NamedTempFile, dir: &TempDir, clock: Arc<ManualClock>) -> CompletionCache {
        let log_store = SqliteLogStore::new(db.path().to_path_buf()).expect("Failed to open log store");
        let local_store = FileLocalStore::new(dir.path()).expect("Failed to open local store");
        CompletionCache::new(
            Arc::new(log_store),
            Arc::new(local_store),
            clock,
            CacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_server_creation() {
        let db = NamedTempFile::new().expect("Failed to create temp file");
        let dir = TempDir::new().expect("Failed to create temp dir");

        let server = CompletionServer::new(
            db.path().to_path_buf(),
            dir.path().join("cache"),
            CacheConfig::default(),
        )
        .await
        .expect("Failed to create server");

        assert!(server.cache().habit_ids().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_reaches_sqlite() {
        let db = NamedTempFile::new().expect("Failed to create temp file");
        let dir = TempDir::new().expect("Failed to create temp dir");
        let habit = HabitId::from("h1");

        let cache = cache_on_disk(&db, &dir, Arc::new(ManualClock::at_noon(today())));
        cache.toggle_status(&habit, today()).await;
        cache.flush().await;

        let store = SqliteLogStore::new(db.path().to_path_buf()).expect("Failed to reopen log store");
        let entries = store
            .fetch_logs(&habit, DateRange::new(today(), today()))
            .await
            .expect("fetch");
        assert_eq!(entries, vec![LogEntry::new(today(), CompletionStatus::Completed)]);
    }

    #[tokio::test]
    async fn test_cache_persists_across_restart() {
        let db = NamedTempFile::new().expect("Failed to create temp file");
        let dir = TempDir::new().expect("Failed to create temp dir");
        let clock = Arc::new(ManualClock::at_noon(today()));
        let habit = HabitId::from("h1");

        let cache = cache_on_disk(&db, &dir, clock.clone());
        cache.toggle_status(&habit, today()).await;
        cache.toggle_status(&habit, today()).await;
        cache.flush().await;
        drop(cache);

        let restarted = cache_on_disk(&db, &dir, clock);
        assert!(restarted.is_loaded(&habit));
        assert_eq!(restarted.get_status(&habit, today()), CompletionStatus::Skipped);
        assert_eq!(restarted.get_totals(&habit), Totals { completed: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn test_history_outside_window_not_loaded() {
        let db = NamedTempFile::new().expect("Failed to create temp file");
        let dir = TempDir::new().expect("Failed to create temp dir");
        let habit = HabitId::from("h1");

        let store = SqliteLogStore::new(db.path().to_path_buf()).expect("Failed to open log store");
        for ago in [0, 10, 30, 31, 60] {
            store
                .save_log(&habit, LogEntry::new(today().days_before(ago), CompletionStatus::Completed))
                .await
                .expect("seed");
        }

        let cache = cache_on_disk(&db, &dir, Arc::new(ManualClock::at_noon(today())));
        cache.ensure_loaded(&habit).await;

        assert_eq!(cache.get_totals(&habit).completed, 3);
        assert_eq!(cache.get_status(&habit, today().days_before(31)), CompletionStatus::Incomplete);
    }

    #[tokio::test]
    async fn test_midnight_rollover_with_file_store() {
        let db = NamedTempFile::new().expect("Failed to create temp file");
        let dir = TempDir::new().expect("Failed to create temp dir");
        let clock = Arc::new(ManualClock::at_noon(today()));

        let cache = cache_on_disk(&db, &dir, clock.clone());
        clock.advance(chrono::Duration::days(1));

        assert_eq!(cache.check_rollover(), Some(today().days_after(1)));

        let local = FileLocalStore::new(dir.path()).expect("Failed to open local store");
        assert_eq!(
            local.get(&CacheConfig::default().day_key).expect("read day"),
            Some("2024-06-02".to_string())
        );
    }
}
