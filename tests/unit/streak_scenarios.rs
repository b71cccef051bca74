/// Cache scenarios: status lookups, streaks, toggles and removal
use habit_completion_cache::*;
use std::sync::Arc;

#[cfg(test)]
mod streak_scenario_tests {
    use super::*;

    fn today() -> DateKey {
        DateKey::from_ymd(2024, 6, 1).unwrap()
    }

    struct Setup {
        cache: CompletionCache,
        logs: Arc<MemoryLogStore>,
    }

    fn setup() -> Setup {
        let logs = Arc::new(MemoryLogStore::new());
        let cache = CompletionCache::new(
            logs.clone(),
            Arc::new(MemoryLocalStore::new()),
            Arc::new(ManualClock::at_noon(today())),
            CacheConfig::default(),
        );
        Setup { cache, logs }
    }

    fn seed(logs: &MemoryLogStore, habit: &HabitId, days: &[(u32, CompletionStatus)]) {
        for (ago, status) in days {
            logs.insert(habit, LogEntry::new(today().days_before(*ago), *status));
        }
    }

    #[tokio::test]
    async fn test_empty_cache_reads_incomplete() {
        let s = setup();
        let status = s.cache.get_status(&HabitId::from("h1"), DateKey::from_ymd(2024, 1, 1).unwrap());
        assert_eq!(status, CompletionStatus::Incomplete);
    }

    #[tokio::test]
    async fn test_loaded_completion_today_gives_streak_of_one() {
        let s = setup();
        let habit = HabitId::from("h1");
        seed(&s.logs, &habit, &[(0, CompletionStatus::Completed)]);

        s.cache.ensure_loaded(&habit).await;

        assert_eq!(s.cache.get_streak(&habit), 1);
    }

    #[tokio::test]
    async fn test_two_completed_days_then_gap() {
        let s = setup();
        let habit = HabitId::from("h1");
        seed(&s.logs, &habit, &[
            (0, CompletionStatus::Completed),
            (1, CompletionStatus::Completed),
        ]);

        s.cache.ensure_loaded(&habit).await;

        assert_eq!(s.cache.get_streak(&habit), 2);
        assert_eq!(s.cache.get_streak_tolerance(&habit), 2);
    }

    #[tokio::test]
    async fn test_skip_is_tolerated_once() {
        let s = setup();
        let habit = HabitId::from("h1");
        seed(&s.logs, &habit, &[
            (0, CompletionStatus::Completed),
            (1, CompletionStatus::Skipped),
            (2, CompletionStatus::Completed),
            (4, CompletionStatus::Completed),
        ]);

        s.cache.ensure_loaded(&habit).await;

        // Day 3 is the second miss, so day 4 never counts.
        assert_eq!(s.cache.get_streak_tolerance(&habit), 2);
        assert_eq!(s.cache.get_streak(&habit), 1);
    }

    #[tokio::test]
    async fn test_toggle_survives_failed_save() {
        let s = setup();
        let habit = HabitId::from("h1");
        s.logs.set_fail_saves(true);

        let status = s.cache.toggle_status(&habit, today()).await;
        s.cache.flush().await;

        assert_eq!(status, CompletionStatus::Completed);
        assert_eq!(s.cache.get_status(&habit, today()), CompletionStatus::Completed);
    }

    #[tokio::test]
    async fn test_remove_clears_everything() {
        let s = setup();
        let habit = HabitId::from("h1");
        seed(&s.logs, &habit, &[
            (0, CompletionStatus::Completed),
            (3, CompletionStatus::Skipped),
        ]);
        s.cache.ensure_loaded(&habit).await;

        s.cache.remove_habit(&habit);

        assert_eq!(s.cache.get_status(&habit, today()), CompletionStatus::Incomplete);
        assert_eq!(s.cache.get_streak(&habit), 0);
        assert_eq!(s.cache.get_totals(&habit), Totals { completed: 0, skipped: 0 });
    }

    #[tokio::test]
    async fn test_totals_match_cached_completed_days() {
        let s = setup();
        let habit = HabitId::from("h1");
        seed(&s.logs, &habit, &[
            (0, CompletionStatus::Completed),
            (5, CompletionStatus::Completed),
            (6, CompletionStatus::Skipped),
            (29, CompletionStatus::Completed),
        ]);
        s.cache.ensure_loaded(&habit).await;

        let snapshot = s.cache.snapshot(&habit).expect("habit is cached");
        let completed = snapshot
            .values()
            .filter(|status| **status == CompletionStatus::Completed)
            .count() as u32;

        assert_eq!(s.cache.get_totals(&habit).completed, completed);
        assert_eq!(completed, 3);
    }

    #[tokio::test]
    async fn test_toggles_on_other_days_change_nothing() {
        let s = setup();
        let habit = HabitId::from("h1");
        seed(&s.logs, &habit, &[(2, CompletionStatus::Completed)]);
        s.cache.ensure_loaded(&habit).await;

        for date in [today().days_before(2), today().days_before(1), today().days_after(1)] {
            let before = s.cache.get_status(&habit, date);
            let returned = s.cache.toggle_status(&habit, date).await;
            assert_eq!(returned, before);
            assert_eq!(s.cache.get_status(&habit, date), before);
        }

        s.cache.flush().await;
        assert_eq!(s.logs.save_count(), 0);
    }

    #[tokio::test]
    async fn test_tolerant_streak_never_below_strict_while_toggling() {
        let s = setup();
        let habit = HabitId::from("h1");
        seed(&s.logs, &habit, &[
            (1, CompletionStatus::Completed),
            (2, CompletionStatus::Skipped),
            (3, CompletionStatus::Completed),
        ]);
        s.cache.ensure_loaded(&habit).await;

        for _ in 0..3 {
            assert!(s.cache.get_streak(&habit) <= s.cache.get_streak_tolerance(&habit));
            s.cache.toggle_status(&habit, today()).await;
        }
    }
}
