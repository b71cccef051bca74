/// Streak and totals calculations over a cached habit log
///
/// These are pure functions: they take a HabitLog and the current local day
/// and walk backwards from today. The cache calls them under its lock, and
/// the tool layer uses the same functions for its summaries.

use serde::{Deserialize, Serialize};

use crate::domain::{CompletionStatus, DateKey, HabitLog};

/// Default safety bound for the backward walks
pub const DEFAULT_WALK_LIMIT: u32 = 365;

/// Number of completed and skipped days in a habit's cached history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub completed: u32,
    pub skipped: u32,
}

fn is_completed(log: &HabitLog, day: &DateKey) -> bool {
    log.get(day).map_or(false, CompletionStatus::is_completed)
}

/// Count consecutive completed days ending at today
///
/// Today must itself be completed, otherwise the streak is 0. The walk is
/// capped at `walk_limit + 1` days so it can never outrun the tolerant walk.
pub fn strict_streak(log: &HabitLog, today: DateKey, walk_limit: u32) -> u32 {
    let mut streak = 0;
    let mut checking_date = today;

    while streak <= walk_limit && is_completed(log, &checking_date) {
        streak += 1;
        checking_date = checking_date.previous();
    }

    streak
}

/// Count completed days walking back from today, tolerating a single miss
///
/// Any day that is not completed counts as a miss. The first miss is skipped
/// over and adds nothing; the second one ends the walk. The walk also stops
/// once `streak + misses` exceeds `walk_limit`.
pub fn tolerant_streak(log: &HabitLog, today: DateKey, walk_limit: u32) -> u32 {
    let mut streak = 0;
    let mut misses = 0;
    let mut checking_date = today;

    loop {
        if is_completed(log, &checking_date) {
            streak += 1;
        } else {
            misses += 1;
            if misses > 1 {
                break;
            }
        }

        if streak + misses > walk_limit {
            break;
        }

        checking_date = checking_date.previous();
    }

    streak
}

/// Count completed and skipped days over the whole log
pub fn totals(log: &HabitLog) -> Totals {
    log.values().fold(Totals::default(), |mut acc, status| {
        match status {
            CompletionStatus::Completed => acc.completed += 1,
            CompletionStatus::Skipped => acc.skipped += 1,
            CompletionStatus::Incomplete => {}
        }
        acc
    })
}

/// Get a motivational message for a streak length
pub fn streak_message(streak: u32) -> String {
    match streak {
        0 => "Ready to start your streak! Every journey begins with a single step.".to_string(),
        1 => "Great start! One day down, keep the momentum going.".to_string(),
        2..=6 => format!("Nice work! {} days in a row. You're building a strong habit.", streak),
        7..=13 => format!("Excellent! {} days strong. You're in the groove now!", streak),
        14..=29 => format!("Amazing! {} days straight. This is becoming second nature.", streak),
        30..=99 => format!("Incredible! {} days of consistency. You're a habit master!", streak),
        _ => format!("Legendary! {} days of unwavering commitment. You're an inspiration!", streak),
    }
}
