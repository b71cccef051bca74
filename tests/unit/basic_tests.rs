/// Basic unit tests to verify core functionality
use habit_completion_cache::*;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_date_key_round_trip_through_text() {
        let key: DateKey = "2024-06-01".parse().expect("valid date");
        assert_eq!(key.to_string(), "2024-06-01");
        assert_eq!(key.previous(), DateKey::from_ymd(2024, 5, 31).unwrap());
    }

    #[test]
    fn test_status_cycle_returns_to_start() {
        for start in [
            CompletionStatus::Incomplete,
            CompletionStatus::Completed,
            CompletionStatus::Skipped,
        ] {
            assert_eq!(start.next().next().next(), start);
        }
    }

    #[test]
    fn test_index_entries_from_log_store_rows() {
        let rows: Vec<LogEntry> = serde_json::from_str(
            r#"[
                {"date": "2024-06-01", "status": "completed"},
                {"date": "2024-05-30", "status": "skipped", "note": "travel"},
                {"date": "2024-05-31", "status": "incomplete"}
            ]"#,
        )
        .expect("valid rows");

        let log = index_entries(rows);

        assert_eq!(log.len(), 2);
        assert_eq!(totals(&log), Totals { completed: 1, skipped: 1 });
    }

    #[test]
    fn test_manual_clock_drives_today() {
        let clock = ManualClock::at_noon(DateKey::from_ymd(2024, 12, 31).unwrap());
        clock.advance(chrono::Duration::hours(12));
        assert_eq!(clock.today(), DateKey::from_ymd(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.history_days, 30);
        assert_eq!(config.retention_days, 90);
        assert_eq!(config.tolerance_walk_limit, 365);
    }

    #[test]
    fn test_storage_creation() {
        let storage = SqliteLogStore::in_memory();
        assert!(storage.is_ok());
    }
}
