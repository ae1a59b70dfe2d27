mod config;

pub use config::{Config, NotificationsConfig, TomlSettingsStore, UiConfig};

use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{ConfigError, Result};
use crate::timer::TimerConfiguration;

/// Returns `~/.config/focustimer[-dev]/` based on FOCUSTIMER_ENV.
///
/// Set FOCUSTIMER_ENV=dev to use a development data directory, or
/// FOCUSTIMER_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSTIMER_CONFIG_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSTIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focustimer-dev")
            } else {
                base_dir.join("focustimer")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Where the timer configuration lives between runs.
///
/// The session reads it once at construction and writes it back after
/// every accepted update.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<TimerConfiguration>;

    fn save(&self, config: &TimerConfiguration) -> Result<()>;
}

/// In-process store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    config: Option<TimerConfiguration>,
    saves: usize,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TimerConfiguration) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                config: Some(config),
                saves: 0,
            }),
        }
    }

    /// Last saved (or seeded) configuration.
    pub fn stored(&self) -> Option<TimerConfiguration> {
        self.inner.lock().ok().and_then(|g| g.config)
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|g| g.saves).unwrap_or(0)
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<TimerConfiguration> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| crate::CoreError::Custom(format!("settings lock poisoned: {e}")))?;
        Ok(guard.config.unwrap_or_default())
    }

    fn save(&self, config: &TimerConfiguration) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| crate::CoreError::Custom(format!("settings lock poisoned: {e}")))?;
        guard.config = Some(*config);
        guard.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_defaults_when_empty() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load().unwrap(), TimerConfiguration::default());
        assert!(store.stored().is_none());
    }

    #[test]
    fn memory_store_counts_saves() {
        let store = MemorySettingsStore::new();
        let cfg = TimerConfiguration::new(40, 8, 20, 4).unwrap();
        store.save(&cfg).unwrap();
        store.save(&cfg).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().unwrap(), cfg);
    }
}
