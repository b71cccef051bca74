/// Tool for checking a habit's status on a day
///
/// This module implements the completion_status MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::CompletionCache;
use crate::domain::{streak_message, CompletionStatus, DomainError, Totals};
use crate::tools::{date_or_today, days, loaded_habit};

/// Parameters for checking a habit's status
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatusParams {
    /// ID of the habit
    pub habit_id: String,
    /// Day to check as YYYY-MM-DD (defaults to today)
    #[serde(default)]
    pub date: Option<String>,
}

/// Response from checking a habit's status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub habit_id: String,
    pub date: String,
    pub status: CompletionStatus,
    pub current_streak: u32,
    pub tolerant_streak: u32,
    pub totals: Totals,
    pub message: String,
}

/// Get the status of a habit on a day along with its streaks
pub async fn get_completion_status(
    cache: &CompletionCache,
    params: StatusParams,
) -> Result<StatusResponse, DomainError> {
    let habit_id = loaded_habit(cache, &params.habit_id).await?;
    let date = date_or_today(cache, params.date.as_deref())?;

    let status = cache.get_status(&habit_id, date);
    let current_streak = cache.get_streak(&habit_id);
    let tolerant_streak = cache.get_streak_tolerance(&habit_id);
    let totals = cache.get_totals(&habit_id);

    let marker = match status {
        CompletionStatus::Completed => "✅",
        CompletionStatus::Skipped => "⏭️",
        CompletionStatus::Incomplete => "⬜",
    };

    let message = format!(
        "{} {} on {}: {}\n   Current streak: {} | With one miss allowed: {}\n   Totals: {} completed, {} skipped\n   {}",
        marker,
        habit_id,
        date,
        status,
        days(current_streak),
        days(tolerant_streak),
        totals.completed,
        totals.skipped,
        streak_message(current_streak)
    );

    Ok(StatusResponse {
        habit_id: habit_id.to_string(),
        date: date.to_string(),
        status,
        current_streak,
        tolerant_streak,
        totals,
        message,
    })
}
