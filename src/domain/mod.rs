/// Domain module containing core business logic and data types
///
/// This module defines the core concepts (HabitId, DateKey, CompletionStatus,
/// LogEntry) and the streak calculations over cached logs.

pub mod entry;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use entry::*;
pub use streak::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid habit ID: {0}")]
    InvalidHabitId(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}
