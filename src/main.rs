/// habit-completion-cache binary
///
/// Opens the log database and the cache directory, then serves the
/// completion tools over stdio until the client hangs up.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use habit_completion_cache::{CacheConfig, CompletionServer};

const DATA_DIR_NAME: &str = "habit_completion";

/// A directory we can create and write into
fn is_writable_dir(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let check_file = dir.join(".write_check");
    let writable = std::fs::write(&check_file, b"ok").is_ok();
    let _ = std::fs::remove_file(&check_file);
    writable
}

/// Pick the data directory: ~/.habit_completion, then the platform data and
/// config dirs, then ./.habit_completion, then the temp dir
fn default_data_dir() -> std::io::Result<PathBuf> {
    let hidden = format!(".{}", DATA_DIR_NAME);
    let candidates = [
        dirs::home_dir().map(|home| home.join(&hidden)),
        dirs::data_dir().map(|data| data.join(DATA_DIR_NAME)),
        dirs::config_dir().map(|config| config.join(DATA_DIR_NAME)),
        std::env::current_dir().ok().map(|cwd| cwd.join(&hidden)),
    ];

    if let Some(dir) = candidates.into_iter().flatten().find(|dir| is_writable_dir(dir)) {
        return Ok(dir);
    }

    let fallback = std::env::temp_dir().join(DATA_DIR_NAME);
    std::fs::create_dir_all(&fallback)?;
    warn!("No writable data directory found, falling back to {}", fallback.display());
    Ok(fallback)
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite file holding the completion logs [default: <data dir>/completions.db]
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory for the persisted cache [default: <data dir>/cache]
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Days of history fetched when a habit is first loaded
    #[arg(long, default_value_t = 30)]
    history_days: u32,

    /// Days kept in the cache before the daily rollover prunes them
    #[arg(long, default_value_t = 90)]
    retention_days: u32,

    /// Log at info level
    #[arg(short, long)]
    debug: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn log_level(&self) -> &'static str {
        match (self.verbose, self.debug) {
            (true, _) => "debug",
            (false, true) => "info",
            (false, false) => "warn",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(format!("habit_completion_cache={}", args.log_level()))
        .with_writer(std::io::stderr)
        .init();

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            path
        }
        None => default_data_dir()?.join("completions.db"),
    };
    let cache_dir = match args.cache_dir {
        Some(dir) => dir,
        None => default_data_dir()?.join("cache"),
    };

    info!(
        "Completion logs in {}, cache in {}",
        db_path.display(),
        cache_dir.display()
    );

    let config = CacheConfig {
        history_days: args.history_days,
        retention_days: args.retention_days,
        ..CacheConfig::default()
    };

    CompletionServer::new(db_path, cache_dir, config).await?.run().await?;

    info!("Completion server stopped");
    Ok(())
}
