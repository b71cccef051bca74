/// Tool for toggling today's completion
///
/// This module implements the completion_toggle MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::CompletionCache;
use crate::domain::{CompletionStatus, DomainError};
use crate::tools::{date_or_today, days, loaded_habit};

/// Parameters for toggling a habit's status
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ToggleParams {
    /// ID of the habit to toggle
    pub habit_id: String,
    /// Day to toggle as YYYY-MM-DD (only today can change; defaults to today)
    #[serde(default)]
    pub date: Option<String>,
}

/// Response from toggling a habit
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub habit_id: String,
    pub date: String,
    pub status: CompletionStatus,
    /// False when the date was not today and nothing changed
    pub changed: bool,
    pub current_streak: u32,
    pub message: String,
}

/// Cycle a habit's status for today
pub async fn toggle_completion(
    cache: &CompletionCache,
    params: ToggleParams,
) -> Result<ToggleResponse, DomainError> {
    let habit_id = loaded_habit(cache, &params.habit_id).await?;
    let date = date_or_today(cache, params.date.as_deref())?;
    let outcome = cache.toggle(&habit_id, date).await;
    let (status, changed) = (outcome.status, outcome.applied);
    let current_streak = cache.get_streak(&habit_id);

    let message = if !changed {
        format!(
            "Only today's status can be changed. {} on {} stays {}.",
            habit_id, date, status
        )
    } else {
        match status {
            CompletionStatus::Completed => format!(
                "🔥 Marked {} as completed for {}! Current streak: {}",
                habit_id, date, days(current_streak)
            ),
            CompletionStatus::Skipped => format!("⏭️ Marked {} as skipped for {}.", habit_id, date),
            CompletionStatus::Incomplete => format!("↩️ Cleared {} for {}.", habit_id, date),
        }
    };

    Ok(ToggleResponse {
        habit_id: habit_id.to_string(),
        date: date.to_string(),
        status,
        changed,
        current_streak,
        message,
    })
}
