mod config;
pub mod database;

pub use config::{AlarmConfig, Config, EntryConfig, LogConfig, TickerConfig};
pub use database::Database;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/countdown[-dev]/` based on COUNTDOWN_ENV.
///
/// Set COUNTDOWN_ENV=dev to use the development data directory, or
/// COUNTDOWN_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("COUNTDOWN_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("COUNTDOWN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("countdown-dev")
            } else {
                base_dir.join("countdown")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
