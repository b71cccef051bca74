/// Tools for streaks and totals
///
/// This module implements the completion_streak and completion_totals MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::CompletionCache;
use crate::domain::{streak_message, DomainError};
use crate::tools::{days, loaded_habit};

/// Parameters naming a single habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HabitParams {
    /// ID of the habit
    pub habit_id: String,
}

/// Response from the streak tool
#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub habit_id: String,
    pub current_streak: u32,
    pub tolerant_streak: u32,
    pub message: String,
}

/// Response from the totals tool
#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    pub habit_id: String,
    pub completed: u32,
    pub skipped: u32,
    pub message: String,
}

/// Strict and tolerant streaks for a habit
pub async fn get_completion_streak(
    cache: &CompletionCache,
    params: HabitParams,
) -> Result<StreakResponse, DomainError> {
    let habit_id = loaded_habit(cache, &params.habit_id).await?;

    let current_streak = cache.get_streak(&habit_id);
    let tolerant_streak = cache.get_streak_tolerance(&habit_id);

    let mut message = format!("🔥 {}: {} in a row", habit_id, days(current_streak));
    if tolerant_streak > current_streak {
        message.push_str(&format!(" ({} counting one missed day)", days(tolerant_streak)));
    }
    message.push_str(&format!("\n{}", streak_message(current_streak)));

    Ok(StreakResponse {
        habit_id: habit_id.to_string(),
        current_streak,
        tolerant_streak,
        message,
    })
}

/// Completed and skipped counts over the cached history
pub async fn get_completion_totals(
    cache: &CompletionCache,
    params: HabitParams,
) -> Result<TotalsResponse, DomainError> {
    let habit_id = loaded_habit(cache, &params.habit_id).await?;
    let totals = cache.get_totals(&habit_id);

    let message = format!(
        "📊 {}: {} completed, {} skipped",
        habit_id, totals.completed, totals.skipped
    );

    Ok(TotalsResponse {
        habit_id: habit_id.to_string(),
        completed: totals.completed,
        skipped: totals.skipped,
        message,
    })
}
