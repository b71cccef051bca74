/// MCP tools for the completion cache
///
/// This module contains the tools that external clients can call to read
/// and toggle daily completions. Each tool ensures the habit is loaded
/// before answering, the way a freshly mounted view would.

pub mod forget;
pub mod status;
pub mod streak;
pub mod toggle;

// Re-export tool functions for easy access
pub use forget::*;
pub use status::*;
pub use streak::*;
pub use toggle::*;

use crate::cache::CompletionCache;
use crate::domain::{DateKey, DomainError, HabitId};

/// Parse an optional date argument, defaulting to the cache's today
pub(crate) fn date_or_today(cache: &CompletionCache, date: Option<&str>) -> Result<DateKey, DomainError> {
    match date {
        Some(s) if !s.trim().is_empty() => s.parse(),
        _ => Ok(cache.today()),
    }
}

/// Parse a habit id argument and make sure the habit is loaded
pub(crate) async fn loaded_habit(cache: &CompletionCache, habit_id: &str) -> Result<HabitId, DomainError> {
    let habit_id = HabitId::parse(habit_id)?;
    cache.ensure_loaded(&habit_id).await;
    Ok(habit_id)
}

/// "1 day" / "3 days"
pub(crate) fn days(n: u32) -> String {
    format!("{} day{}", n, if n == 1 { "" } else { "s" })
}
