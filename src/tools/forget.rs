/// Tool for dropping a habit from the cache
///
/// This module implements the completion_forget MCP tool, used when a habit
/// is deleted elsewhere and its cached days should go with it.

use serde::Serialize;

use crate::cache::CompletionCache;
use crate::domain::{DomainError, HabitId};
use crate::tools::HabitParams;

/// Response from forgetting a habit
#[derive(Debug, Serialize)]
pub struct ForgetResponse {
    pub habit_id: String,
    /// Whether the habit had a cache entry before the call
    pub was_cached: bool,
    pub message: String,
}

/// Remove a habit's cached days
pub fn forget_habit(cache: &CompletionCache, params: HabitParams) -> Result<ForgetResponse, DomainError> {
    let habit_id = HabitId::parse(&params.habit_id)?;
    let was_cached = cache.remove_habit(&habit_id);

    let message = if was_cached {
        format!("🗑️ Removed cached completions for {}.", habit_id)
    } else {
        format!("Nothing cached for {}.", habit_id)
    };

    Ok(ForgetResponse {
        habit_id: habit_id.to_string(),
        was_cached,
        message,
    })
}
