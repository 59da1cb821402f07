//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Alarm sound, volume and auto-stop time
//! - Tick period
//! - Log level
//! - Default duration for a new simple countdown
//!
//! Configuration is stored at `~/.config/countdown/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::alarm::AlarmSound;
use crate::error::{ConfigError, Result};
use crate::timer::TimeEntry;

/// Alarm configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_auto_stop_secs")]
    pub auto_stop_secs: u64,
    #[serde(default)]
    pub sound: AlarmSound,
    #[serde(default = "default_50")]
    pub volume: u32,
}

/// Tick source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Length of one engine tick. One second in normal use.
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. "info" or "countdown_core=debug".
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Time entry defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// `HH:MM:SS` used when a simple run is started without a duration.
    #[serde(default = "default_duration")]
    pub default_duration: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/countdown/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub entry: EntryConfig,
}

// Default functions
fn default_auto_stop_secs() -> u64 {
    60
}
fn default_50() -> u32 {
    50
}
fn default_period_ms() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".into()
}
fn default_duration() -> String {
    "00:05:00".into()
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            auto_stop_secs: default_auto_stop_secs(),
            sound: AlarmSound::default(),
            volume: default_50(),
        }
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".into(),
        };
        let bad_value = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| bad_value(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| bad_value(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(bad_value("not a leaf value".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(ConfigError::from)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field (including enum fields such as `alarm.sound`).
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.period_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ticker.period_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.alarm.volume > 100 {
            return Err(ConfigError::InvalidValue {
                key: "alarm.volume".into(),
                message: "must be between 0 and 100".into(),
            });
        }
        self.default_entry().map(|_| ())
    }

    pub fn auto_stop(&self) -> Duration {
        Duration::from_secs(self.alarm.auto_stop_secs)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.ticker.period_ms.max(1))
    }

    pub fn default_entry(&self) -> Result<TimeEntry, ConfigError> {
        self.entry
            .default_duration
            .parse()
            .map_err(|e: crate::error::ValidationError| ConfigError::InvalidValue {
                key: "entry.default_duration".into(),
                message: e.to_string(),
            })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }
}
