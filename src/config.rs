/// Tunable settings for the completion cache

use std::time::Duration;

use crate::domain::DEFAULT_WALK_LIMIT;

/// Settings for a CompletionCache
///
/// The defaults match what the web client has always used; the binary lets
/// the history and retention windows be overridden from the command line.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How many days back a first load fetches (plus today)
    pub history_days: u32,
    /// Days older than this are pruned at rollover
    pub retention_days: u32,
    /// Safety bound for the tolerant streak walk
    pub tolerance_walk_limit: u32,
    /// Local store key holding the serialized cache
    pub cache_key: String,
    /// Local store key holding the tracked current day
    pub day_key: String,
    /// Local store key listing habits toggled before their history was fetched
    pub partial_key: String,
    /// Delay after midnight before the rollover check runs
    pub rollover_grace: Duration,
    /// Longest single sleep of the rollover scheduler
    pub max_rollover_sleep: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            history_days: 30,
            retention_days: 90,
            tolerance_walk_limit: DEFAULT_WALK_LIMIT,
            cache_key: "habit-completion-cache".to_string(),
            day_key: "habit-completion-day".to_string(),
            partial_key: "habit-completion-partial".to_string(),
            rollover_grace: Duration::from_secs(1),
            max_rollover_sleep: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Delay before the next rollover check, given the time left until midnight
    pub fn rollover_delay(&self, until_midnight: Duration) -> Duration {
        (until_midnight + self.rollover_grace).min(self.max_rollover_sleep)
    }
}
