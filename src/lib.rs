/// Public library interface for the habit completion cache
///
/// This module exports the completion cache, its stores and domain types,
/// and the MCP server that exposes the cache over stdin/stdout.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

// Internal modules
mod cache;
mod clock;
mod config;
mod domain;
mod mcp;
mod storage;
mod tools;

// Re-export public modules and types
pub use cache::{CompletionCache, RolloverSubscription, ToggleOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use domain::*;
pub use mcp::{JsonRpcError, JsonRpcResponse, McpServer};
pub use storage::{
    FileLocalStore, LocalStore, LogStore, MemoryLocalStore, MemoryLogStore, SqliteLogStore,
    StorageError,
};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Domain validation error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Completion server: the cache wired to on-disk stores and an MCP front end
///
/// Logs live in a SQLite database; the cache itself is persisted as files in
/// a separate directory so it survives restarts.
pub struct CompletionServer {
    cache: CompletionCache,
}

impl CompletionServer {
    /// Create a server with the given database path and cache directory
    ///
    /// This will initialize the SQLite schema if it doesn't already exist.
    pub async fn new(
        db_path: PathBuf,
        cache_dir: PathBuf,
        config: CacheConfig,
    ) -> Result<Self, ServerError> {
        tracing::info!("Initializing completion server with database: {:?}", db_path);

        let log_store = SqliteLogStore::new(db_path)?;
        let local_store = FileLocalStore::new(cache_dir)?;

        let cache = CompletionCache::new(
            Arc::new(log_store),
            Arc::new(local_store),
            Arc::new(SystemClock),
            config,
        );

        Ok(Self { cache })
    }

    /// Wrap an already constructed cache
    pub fn from_cache(cache: CompletionCache) -> Self {
        Self { cache }
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until stdin closes or an error occurs. The
    /// daily rollover task runs for as long as the server does.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            "Starting completion server, {} habits cached, today is {}",
            self.cache.habit_ids().len(),
            self.cache.today()
        );

        let rollover = self.cache.spawn_rollover_task();
        let _day_log = self.cache.on_rollover(|day| {
            tracing::info!("New day {}, today-scoped views should refresh", day);
        });

        let mut mcp_server = McpServer::new(self.cache.clone());
        let result = mcp_server.run().await;

        rollover.abort();
        result
    }

    /// Get a reference to the completion cache (useful for testing)
    pub fn cache(&self) -> &CompletionCache {
        &self.cache
    }
}
