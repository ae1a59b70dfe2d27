//! TOML-based application configuration.
//!
//! The single settings record of the application:
//! - Timer durations and long break cadence
//! - Notification preferences
//! - Display name used in window titles
//!
//! Configuration is stored at `~/.config/focustimer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{data_dir, SettingsStore};
use crate::error::{ConfigError, CoreError, Result};
use crate::timer::{ConfigurationUpdate, TimerConfiguration};

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
}

/// UI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focustimer/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfiguration,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

fn default_true() -> bool {
    true
}
fn default_app_name() -> String {
    "Focus Timer".into()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
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

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || CoreError::from(ConfigError::UnknownKey(key.to_string()));
        let invalid = |message: String| {
            CoreError::from(ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("expected true or false, got '{value}'")))?,
                    ),
                    serde_json::Value::String(_) => serde_json::Value::String(value.into()),
                    serde_json::Value::Object(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    _ => return Err(invalid("value cannot be set from text".into())),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing the defaults there if the file is missing.
    ///
    /// Timer values are checked one field at a time: a negative, non-numeric
    /// or out-of-range value falls back to its default and the other fields
    /// are kept.
    pub fn load_from(path: &Path) -> Result<Self> {
        match Self::read_table(path)? {
            Some(mut table) => {
                let timer = table.remove("timer");
                let load_failed = |message: String| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message,
                };
                let mut cfg: Config = toml::Value::Table(table)
                    .try_into()
                    .map_err(|e: toml::de::Error| load_failed(e.to_string()))?;
                match timer {
                    Some(toml::Value::Table(timer)) => {
                        let (settings, rejected) = TimerConfiguration::from_table(&timer);
                        for e in &rejected {
                            warn!(path = %path.display(), "timer setting replaced by default: {e}");
                        }
                        cfg.timer = settings;
                    }
                    Some(_) => {
                        warn!(path = %path.display(), "[timer] is not a table, using defaults");
                    }
                    None => {}
                }
                Ok(cfg)
            }
            None => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Parse the file at `path` as an untyped table. `None` if it does not exist.
    fn read_table(path: &Path) -> Result<Option<toml::Table>> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(load_failed(e.to_string()).into()),
        };
        let table: toml::Table =
            toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        Ok(Some(table))
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "config saved");
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

    /// Set a config value by key. Does not persist.
    ///
    /// Timer keys go through the same range checks as a live
    /// configuration update.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(field) = key.strip_prefix("timer.") {
            let update = ConfigurationUpdate::new().set_key(field, value)?;
            let report = self.timer.apply(&update);
            if let Some(rejected) = report.rejected.into_iter().next() {
                return Err(rejected.into());
            }
            return Ok(());
        }

        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("falling back to default config: {e}");
            Self::default()
        })
    }
}

/// [`SettingsStore`] backed by the `[timer]` section of a config file.
///
/// Saving rewrites only the timer section; other sections are preserved
/// as they are on disk.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default config location.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<TimerConfiguration> {
        Ok(Config::load_from(&self.path)?.timer)
    }

    /// Merges into the file as it is on disk. A file that no longer parses
    /// is left alone and reported as an error.
    fn save(&self, config: &TimerConfiguration) -> Result<()> {
        let mut table = match Config::read_table(&self.path)? {
            Some(table) => table,
            None => match toml::Value::try_from(Config::default())? {
                toml::Value::Table(table) => table,
                _ => toml::Table::new(),
            },
        };
        table.insert("timer".into(), toml::Value::try_from(config)?);
        let content = toml::to_string_pretty(&table)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content).map_err(|e| ConfigError::SaveFailed {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        debug!(path = %self.path.display(), "timer settings saved");
        Ok(())
    }
}
