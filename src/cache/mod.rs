/// Completion cache and streak engine
///
/// The cache keeps, per habit, a map of day -> status for the recent past.
/// Reads are synchronous lookups against that map. The only mutation is
/// toggling today's status, which is applied locally first and then saved
/// to the log store in the background. Failures of the log store or of the
/// local store are logged and otherwise ignored: callers always get the
/// best local answer.

mod rollover;

pub use rollover::RolloverSubscription;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::domain::{
    index_entries, strict_streak, tolerant_streak, totals, CompletionStatus, DateKey, DateRange,
    HabitId, HabitLog, LogEntry, Totals,
};
use crate::storage::{LocalStore, LogStore};

use rollover::RolloverListeners;

/// A fetch that several callers can await; resolves once the cache is updated
type SharedLoad = Shared<BoxFuture<'static, ()>>;

struct CacheState {
    habits: HashMap<HabitId, HabitLog>,
    /// Habits whose entry was started by a toggle before any fetch succeeded
    partial: HashSet<HabitId>,
    loading: HashMap<HabitId, SharedLoad>,
    current_day: DateKey,
}

impl CacheState {
    fn needs_fetch(&self, habit_id: &HabitId) -> bool {
        !self.habits.contains_key(habit_id) || self.partial.contains(habit_id)
    }
}

struct Inner {
    log_store: Arc<dyn LogStore>,
    local_store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    state: Mutex<CacheState>,
    listeners: Arc<RolloverListeners>,
    pending_saves: Mutex<JoinSet<()>>,
}

enum LoadState {
    Cached,
    InFlight(SharedLoad),
    Started(SharedLoad),
}

/// Clears a habit's loading marker when its load task ends, however it ends
struct LoadingMarker {
    cache: CompletionCache,
    habit_id: HabitId,
}

impl Drop for LoadingMarker {
    fn drop(&mut self) {
        self.cache.state().loading.remove(&self.habit_id);
    }
}

/// What a toggle request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Status of the requested day after the call
    pub status: CompletionStatus,
    /// False when the day was not today and nothing changed
    pub applied: bool,
}

/// Handle to the completion cache
///
/// Cloning is cheap and every clone shares the same cache. Async operations
/// need a tokio runtime since loads and saves run as spawned tasks.
#[derive(Clone)]
pub struct CompletionCache {
    inner: Arc<Inner>,
}

impl CompletionCache {
    /// Create a cache, restoring whatever the local store holds
    ///
    /// If the persisted current day is older than the clock's today, the
    /// rollover runs once right away so stale days are pruned.
    pub fn new(
        log_store: Arc<dyn LogStore>,
        local_store: Arc<dyn LocalStore>,
        clock: Arc<dyn Clock>,
        config: CacheConfig,
    ) -> Self {
        let today = clock.today();
        let habits = restore_habits(local_store.as_ref(), &config.cache_key);
        let mut partial = restore_partial(local_store.as_ref(), &config.partial_key);
        partial.retain(|habit_id| habits.contains_key(habit_id));
        let tracked_day = restore_day(local_store.as_ref(), &config.day_key).unwrap_or(today);

        info!(
            "Completion cache restored {} habits, {} awaiting history (tracked day {}, today {})",
            habits.len(),
            partial.len(),
            tracked_day,
            today
        );

        let cache = Self {
            inner: Arc::new(Inner {
                log_store,
                local_store,
                clock,
                config,
                state: Mutex::new(CacheState {
                    habits,
                    partial,
                    loading: HashMap::new(),
                    current_day: tracked_day,
                }),
                listeners: Arc::new(RolloverListeners::default()),
                pending_saves: Mutex::new(JoinSet::new()),
            }),
        };

        if cache.check_rollover().is_none() {
            cache.persist_day(tracked_day);
        }

        cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Today's key according to the cache's clock
    pub fn today(&self) -> DateKey {
        self.inner.clock.today()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Load a habit's recent history unless it is cached or already loading
    ///
    /// A caller arriving while another load for the same habit is in flight
    /// returns immediately. A failed load leaves the habit unloaded so the
    /// next call retries.
    pub async fn ensure_loaded(&self, habit_id: &HabitId) {
        if let LoadState::Started(load) = self.begin_load(habit_id) {
            load.await;
        }
    }

    fn begin_load(&self, habit_id: &HabitId) -> LoadState {
        let mut state = self.state();

        if !state.needs_fetch(habit_id) {
            return LoadState::Cached;
        }
        if let Some(load) = state.loading.get(habit_id) {
            return LoadState::InFlight(load.clone());
        }

        // The fetch runs as its own task so it completes even if the caller goes away.
        let marker = LoadingMarker {
            cache: self.clone(),
            habit_id: habit_id.clone(),
        };
        let task = tokio::spawn(self.clone().load(habit_id.clone(), marker));
        let task_habit = habit_id.clone();
        let load = async move {
            if let Err(e) = task.await {
                warn!("Load task for habit {} did not finish: {}", task_habit, e);
            }
        }
        .boxed()
        .shared();

        state.loading.insert(habit_id.clone(), load.clone());
        LoadState::Started(load)
    }

    async fn load(self, habit_id: HabitId, _marker: LoadingMarker) {
        let today = self.inner.clock.today();
        let range = DateRange::ending_at(today, self.inner.config.history_days);

        debug!("Loading logs for habit {} from {} to {}", habit_id, range.from, range.to);
        let result = self.inner.log_store.fetch_logs(&habit_id, range).await;

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to load logs for habit {}, will retry later: {}", habit_id, e);
                return;
            }
        };

        let fetched = index_entries(entries);
        debug!("Loaded {} days for habit {}", fetched.len(), habit_id);

        let mut guard = self.state();
        let state = &mut *guard;
        let was_partial = state.partial.remove(&habit_id);

        match state.habits.entry(habit_id) {
            Entry::Vacant(slot) => {
                slot.insert(fetched);
            }
            Entry::Occupied(mut slot) if was_partial => {
                // Days toggled locally win over what the log store returned.
                let log = slot.get_mut();
                for (date, status) in fetched {
                    log.entry(date).or_insert(status);
                }
                info!("Merged fetched history under local days for habit {}", slot.key());
            }
            Entry::Occupied(_) => {}
        }

        self.persist(state);
    }

    /// Whether the habit's history has been fetched into the cache
    pub fn is_loaded(&self, habit_id: &HabitId) -> bool {
        !self.state().needs_fetch(habit_id)
    }

    /// Status of a habit on a day; never fetches
    pub fn get_status(&self, habit_id: &HabitId, date: DateKey) -> CompletionStatus {
        self.state()
            .habits
            .get(habit_id)
            .and_then(|log| log.get(&date).copied())
            .unwrap_or_default()
    }

    /// Cycle today's status and return the new one
    ///
    /// Shorthand for [`CompletionCache::toggle`] when only the status matters.
    pub async fn toggle_status(&self, habit_id: &HabitId, date: DateKey) -> CompletionStatus {
        self.toggle(habit_id, date).await.status
    }

    /// Cycle today's status
    ///
    /// Only today's key may change; any other date is left alone and its
    /// current status is returned with `applied` unset. The new status is
    /// cached and persisted locally before the log store save is started,
    /// and it is kept even if that save fails. If the history cannot be
    /// fetched first, the habit keeps its local days and the history is
    /// fetched again on the next load.
    pub async fn toggle(&self, habit_id: &HabitId, date: DateKey) -> ToggleOutcome {
        let today = self.inner.clock.today();
        if date != today {
            debug!("Ignoring toggle of habit {} for {} (today is {})", habit_id, date, today);
            return ToggleOutcome {
                status: self.get_status(habit_id, date),
                applied: false,
            };
        }

        match self.begin_load(habit_id) {
            LoadState::Cached => {}
            LoadState::InFlight(load) | LoadState::Started(load) => load.await,
        }

        let next = {
            let mut guard = self.state();
            let state = &mut *guard;
            if !state.habits.contains_key(habit_id) {
                state.partial.insert(habit_id.clone());
            }

            let log = state.habits.entry(habit_id.clone()).or_default();
            let next = log.get(&date).copied().unwrap_or_default().next();
            match next {
                CompletionStatus::Incomplete => {
                    log.remove(&date);
                }
                status => {
                    log.insert(date, status);
                }
            }
            self.persist(state);
            next
        };

        debug!("Toggled habit {} on {} to {}", habit_id, date, next);
        self.spawn_save(habit_id.clone(), LogEntry::new(date, next));
        ToggleOutcome {
            status: next,
            applied: true,
        }
    }

    fn spawn_save(&self, habit_id: HabitId, entry: LogEntry) {
        let store = self.inner.log_store.clone();
        let mut saves = self.inner.pending_saves.lock().unwrap_or_else(|e| e.into_inner());

        // Reap finished saves so the set only holds outstanding ones.
        while saves.try_join_next().is_some() {}

        saves.spawn(async move {
            let date = entry.date;
            if let Err(e) = store.save_log(&habit_id, entry).await {
                warn!("Failed to save log for habit {} on {}, keeping local status: {}", habit_id, date, e);
            }
        });
    }

    /// Wait for every log store save started so far
    pub async fn flush(&self) {
        let mut saves = {
            let mut pending = self.inner.pending_saves.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };

        while let Some(result) = saves.join_next().await {
            if let Err(e) = result {
                warn!("Save task did not finish: {}", e);
            }
        }
    }

    /// Consecutive completed days ending today
    pub fn get_streak(&self, habit_id: &HabitId) -> u32 {
        let today = self.inner.clock.today();
        let limit = self.inner.config.tolerance_walk_limit;
        self.state()
            .habits
            .get(habit_id)
            .map_or(0, |log| strict_streak(log, today, limit))
    }

    /// Completed days walking back from today, tolerating one miss
    pub fn get_streak_tolerance(&self, habit_id: &HabitId) -> u32 {
        let today = self.inner.clock.today();
        let limit = self.inner.config.tolerance_walk_limit;
        self.state()
            .habits
            .get(habit_id)
            .map_or(0, |log| tolerant_streak(log, today, limit))
    }

    /// Completed and skipped counts over everything cached for the habit
    pub fn get_totals(&self, habit_id: &HabitId) -> Totals {
        self.state()
            .habits
            .get(habit_id)
            .map(totals)
            .unwrap_or_default()
    }

    /// Drop a habit's cache entry; a no-op if there is none
    ///
    /// Returns whether an entry was removed.
    pub fn remove_habit(&self, habit_id: &HabitId) -> bool {
        let mut state = self.state();
        state.partial.remove(habit_id);
        if state.habits.remove(habit_id).is_some() {
            info!("Removed habit {} from the completion cache", habit_id);
            self.persist(&state);
            true
        } else {
            false
        }
    }

    /// Copy of a habit's cached days
    pub fn snapshot(&self, habit_id: &HabitId) -> Option<HabitLog> {
        self.state().habits.get(habit_id).cloned()
    }

    /// Ids of every cached habit, sorted
    pub fn habit_ids(&self) -> Vec<HabitId> {
        let mut ids: Vec<HabitId> = self.state().habits.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The day the cache currently treats as today
    pub fn current_day(&self) -> DateKey {
        self.state().current_day
    }

    fn persist(&self, state: &CacheState) {
        let store = self.inner.local_store.as_ref();
        let config = &self.inner.config;

        match serde_json::to_string(&state.habits) {
            Ok(blob) => {
                if let Err(e) = store.set(&config.cache_key, &blob) {
                    warn!("Failed to persist completion cache, keeping it in memory: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize completion cache: {}", e),
        }

        let mut partial: Vec<&HabitId> = state.partial.iter().collect();
        partial.sort();
        match serde_json::to_string(&partial) {
            Ok(blob) => {
                if let Err(e) = store.set(&config.partial_key, &blob) {
                    warn!("Failed to persist habits awaiting history: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize habits awaiting history: {}", e),
        }
    }

    fn persist_day(&self, day: DateKey) {
        if let Err(e) = self.inner.local_store.set(&self.inner.config.day_key, &day.to_string()) {
            warn!("Failed to persist current day {}: {}", day, e);
        }
    }
}

fn restore_habits(store: &dyn LocalStore, key: &str) -> HashMap<HabitId, HabitLog> {
    let blob = match store.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return HashMap::new(),
        Err(e) => {
            warn!("Failed to read persisted completion cache: {}", e);
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<HabitId, HabitLog>>(&blob) {
        Ok(mut habits) => {
            for log in habits.values_mut() {
                log.retain(|_, status| *status != CompletionStatus::Incomplete);
            }
            habits
        }
        Err(e) => {
            warn!("Ignoring unreadable completion cache: {}", e);
            HashMap::new()
        }
    }
}

fn restore_partial(store: &dyn LocalStore, key: &str) -> HashSet<HabitId> {
    let blob = match store.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return HashSet::new(),
        Err(e) => {
            warn!("Failed to read habits awaiting history: {}", e);
            return HashSet::new();
        }
    };

    serde_json::from_str(&blob).unwrap_or_else(|e| {
        warn!("Ignoring unreadable list of habits awaiting history: {}", e);
        HashSet::new()
    })
}

fn restore_day(store: &dyn LocalStore, key: &str) -> Option<DateKey> {
    match store.get(key) {
        Ok(Some(value)) => match value.parse() {
            Ok(day) => Some(day),
            Err(e) => {
                warn!("Ignoring unreadable tracked day '{}': {}", value, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read tracked day: {}", e);
            None
        }
    }
}
