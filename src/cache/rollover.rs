/// Daily rollover: tracking the current day, pruning, and notifying listeners

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{CompletionCache, Inner};
use crate::domain::DateKey;

type RolloverCallback = Arc<dyn Fn(&DateKey) + Send + Sync>;

/// Registered rollover callbacks, keyed by subscription id
#[derive(Default)]
pub(super) struct RolloverListeners {
    next_id: AtomicU64,
    callbacks: Mutex<BTreeMap<u64, RolloverCallback>>,
}

impl RolloverListeners {
    fn subscribe(&self, callback: RolloverCallback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, callback);
        id
    }

    fn unsubscribe(&self, id: u64) {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    fn notify(&self, day: &DateKey) {
        // Callbacks run without the lock held so they may subscribe or unsubscribe.
        let callbacks: Vec<RolloverCallback> = self
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();

        for callback in callbacks {
            callback(day);
        }
    }
}

/// Registration of a rollover callback
///
/// The callback stays registered until this value is dropped or
/// `unsubscribe` is called.
#[must_use = "dropping the subscription unregisters the callback"]
pub struct RolloverSubscription {
    listeners: Weak<RolloverListeners>,
    id: u64,
}

impl RolloverSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for RolloverSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.unsubscribe(self.id);
        }
    }
}

impl CompletionCache {
    /// Register a callback fired with the new day on every rollover
    pub fn on_rollover<F>(&self, callback: F) -> RolloverSubscription
    where
        F: Fn(&DateKey) + Send + Sync + 'static,
    {
        let id = self.inner.listeners.subscribe(Arc::new(callback));
        RolloverSubscription {
            listeners: Arc::downgrade(&self.inner.listeners),
            id,
        }
    }

    /// Advance the tracked day if the clock has moved to another day
    ///
    /// On a change this prunes days older than the retention window from
    /// every habit, persists the cache and the new day, then notifies the
    /// rollover callbacks. Returns the new day, or None if nothing changed.
    pub fn check_rollover(&self) -> Option<DateKey> {
        let today = self.inner.clock.today();

        {
            let mut state = self.state();
            if state.current_day == today {
                return None;
            }

            let previous = std::mem::replace(&mut state.current_day, today);
            let cutoff = today.days_before(self.inner.config.retention_days);

            let mut pruned = 0;
            for log in state.habits.values_mut() {
                let before = log.len();
                *log = log.split_off(&cutoff);
                pruned += before - log.len();
            }

            info!("Day rolled over from {} to {}, pruned {} old entries", previous, today, pruned);
            self.persist(&state);
        }

        self.persist_day(today);
        self.inner.listeners.notify(&today);
        Some(today)
    }

    /// Start the background task that runs the rollover after each midnight
    ///
    /// The delay is recomputed from the clock before every sleep and capped
    /// by `max_rollover_sleep`, so a machine waking from sleep catches up
    /// within one cap interval. The task ends once every cache handle is gone.
    pub fn spawn_rollover_task(&self) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            loop {
                let delay = match weak.upgrade() {
                    Some(inner) => inner.config.rollover_delay(inner.clock.until_next_midnight()),
                    None => break,
                };

                debug!("Next rollover check in {:?}", delay);
                tokio::time::sleep(delay).await;

                match weak.upgrade() {
                    Some(inner) => {
                        CompletionCache { inner }.check_rollover();
                    }
                    None => break,
                }
            }
            debug!("Rollover task stopped");
        })
    }
}
