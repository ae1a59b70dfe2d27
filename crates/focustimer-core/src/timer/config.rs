//! Interval durations and their validation.
//!
//! Every field is validated on its own: an update carrying one bad value
//! still applies the good ones, and the bad field keeps its previous value.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::mode::TimerMode;
use crate::error::ValidationError;

pub const MIN_DURATION_MIN: u32 = 1;
pub const MAX_DURATION_MIN: u32 = 120;
pub const MIN_POMODOROS_UNTIL_LONG_BREAK: u32 = 1;
pub const MAX_POMODOROS_UNTIL_LONG_BREAK: u32 = 10;

/// One of the four configurable timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    FocusDuration,
    ShortBreakDuration,
    LongBreakDuration,
    PomodorosUntilLongBreak,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::FocusDuration,
        ConfigField::ShortBreakDuration,
        ConfigField::LongBreakDuration,
        ConfigField::PomodorosUntilLongBreak,
    ];

    /// Key used in the settings file and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            ConfigField::FocusDuration => "focus_duration",
            ConfigField::ShortBreakDuration => "short_break_duration",
            ConfigField::LongBreakDuration => "long_break_duration",
            ConfigField::PomodorosUntilLongBreak => "pomodoros_until_long_break",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Inclusive accepted range.
    pub fn range(self) -> (u32, u32) {
        match self {
            ConfigField::PomodorosUntilLongBreak => {
                (MIN_POMODOROS_UNTIL_LONG_BREAK, MAX_POMODOROS_UNTIL_LONG_BREAK)
            }
            _ => (MIN_DURATION_MIN, MAX_DURATION_MIN),
        }
    }

    pub fn default_value(self) -> u32 {
        match self {
            ConfigField::FocusDuration => default_focus_duration(),
            ConfigField::ShortBreakDuration => default_short_break_duration(),
            ConfigField::LongBreakDuration => default_long_break_duration(),
            ConfigField::PomodorosUntilLongBreak => default_pomodoros_until_long_break(),
        }
    }

    /// Check a numeric value against this field's range.
    pub fn validate(self, value: i64) -> Result<u32, ValidationError> {
        let (min, max) = self.range();
        if value < min as i64 || value > max as i64 {
            return Err(ValidationError::OutOfRange {
                field: self.key(),
                value,
                min,
                max,
            });
        }
        Ok(value as u32)
    }

    /// Parse and check raw text (as typed into a form or on the CLI).
    pub fn validate_str(self, raw: &str) -> Result<u32, ValidationError> {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::NotANumber {
                field: self.key(),
                raw: raw.to_string(),
            })?;
        self.validate(value)
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Durations (minutes) for each mode plus the long break cadence.
///
/// Values are always within range once constructed through [`new`](Self::new),
/// [`apply`](Self::apply), [`sanitized`](Self::sanitized) or
/// [`from_table`](Self::from_table). Plain deserialization takes values
/// as-is, so settings loaded from disk go through `from_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfiguration {
    #[serde(default = "default_focus_duration")]
    focus_duration: u32,
    #[serde(default = "default_short_break_duration")]
    short_break_duration: u32,
    #[serde(default = "default_long_break_duration")]
    long_break_duration: u32,
    #[serde(default = "default_pomodoros_until_long_break")]
    pomodoros_until_long_break: u32,
}

fn default_focus_duration() -> u32 {
    25
}
fn default_short_break_duration() -> u32 {
    5
}
fn default_long_break_duration() -> u32 {
    30
}
fn default_pomodoros_until_long_break() -> u32 {
    3
}

impl Default for TimerConfiguration {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            short_break_duration: default_short_break_duration(),
            long_break_duration: default_long_break_duration(),
            pomodoros_until_long_break: default_pomodoros_until_long_break(),
        }
    }
}

impl TimerConfiguration {
    /// Build a configuration, rejecting the first out-of-range value.
    pub fn new(
        focus_duration: u32,
        short_break_duration: u32,
        long_break_duration: u32,
        pomodoros_until_long_break: u32,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            focus_duration: ConfigField::FocusDuration.validate(focus_duration as i64)?,
            short_break_duration: ConfigField::ShortBreakDuration
                .validate(short_break_duration as i64)?,
            long_break_duration: ConfigField::LongBreakDuration
                .validate(long_break_duration as i64)?,
            pomodoros_until_long_break: ConfigField::PomodorosUntilLongBreak
                .validate(pomodoros_until_long_break as i64)?,
        })
    }

    pub fn focus_duration(&self) -> u32 {
        self.focus_duration
    }

    pub fn short_break_duration(&self) -> u32 {
        self.short_break_duration
    }

    pub fn long_break_duration(&self) -> u32 {
        self.long_break_duration
    }

    pub fn pomodoros_until_long_break(&self) -> u32 {
        self.pomodoros_until_long_break
    }

    pub fn get(&self, field: ConfigField) -> u32 {
        match field {
            ConfigField::FocusDuration => self.focus_duration,
            ConfigField::ShortBreakDuration => self.short_break_duration,
            ConfigField::LongBreakDuration => self.long_break_duration,
            ConfigField::PomodorosUntilLongBreak => self.pomodoros_until_long_break,
        }
    }

    fn slot(&mut self, field: ConfigField) -> &mut u32 {
        match field {
            ConfigField::FocusDuration => &mut self.focus_duration,
            ConfigField::ShortBreakDuration => &mut self.short_break_duration,
            ConfigField::LongBreakDuration => &mut self.long_break_duration,
            ConfigField::PomodorosUntilLongBreak => &mut self.pomodoros_until_long_break,
        }
    }

    /// Duration of `mode` in minutes.
    pub fn duration_min(&self, mode: TimerMode) -> u32 {
        self.get(mode.duration_field())
    }

    /// Duration of `mode` in seconds.
    pub fn duration_secs(&self, mode: TimerMode) -> u64 {
        u64::from(self.duration_min(mode)).saturating_mul(60)
    }

    /// Apply every field of `update` that validates; keep the rest.
    pub fn apply(&mut self, update: &ConfigurationUpdate) -> ConfigurationReport {
        let mut report = ConfigurationReport::default();
        for (field, input) in &update.entries {
            let checked = match input {
                SettingInput::Number(n) => field.validate(*n),
                SettingInput::Text(raw) => field.validate_str(raw),
            };
            match checked {
                Ok(value) => {
                    *self.slot(*field) = value;
                    report.accepted.push(*field);
                }
                Err(e) => report.rejected.push(e),
            }
        }
        report
    }

    /// Replace out-of-range fields with their defaults.
    pub fn sanitized(mut self) -> Self {
        for field in ConfigField::ALL {
            if field.validate(self.get(field) as i64).is_err() {
                *self.slot(field) = field.default_value();
            }
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        ConfigField::ALL
            .into_iter()
            .all(|f| f.validate(self.get(f) as i64).is_ok())
    }

    /// Read settings from a loosely typed `[timer]` table.
    ///
    /// Each field is checked on its own. Missing fields and fields that fail
    /// validation (negative, text, out of range) keep their defaults; the
    /// failures are returned so the caller can report them.
    pub fn from_table(table: &toml::Table) -> (Self, Vec<ValidationError>) {
        let update = ConfigField::ALL
            .into_iter()
            .fold(ConfigurationUpdate::new(), |update, field| {
                match table.get(field.key()) {
                    None => update,
                    Some(toml::Value::Integer(n)) => update.set(field, *n),
                    Some(toml::Value::String(raw)) => update.set_raw(field, raw.as_str()),
                    Some(other) => update.set_raw(field, other.to_string()),
                }
            });
        let mut config = Self::default();
        let report = config.apply(&update);
        (config, report.rejected)
    }
}

/// Raw value for a single setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingInput {
    Number(i64),
    Text(String),
}

/// A partial configuration change.
///
/// Fields that are not mentioned are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationUpdate {
    entries: Vec<(ConfigField, SettingInput)>,
}

impl ConfigurationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: ConfigField, value: i64) -> Self {
        self.entries.push((field, SettingInput::Number(value)));
        self
    }

    pub fn set_raw(mut self, field: ConfigField, raw: impl Into<String>) -> Self {
        self.entries.push((field, SettingInput::Text(raw.into())));
        self
    }

    /// Look the field up by key, then record the raw text.
    pub fn set_key(self, key: &str, raw: impl Into<String>) -> Result<Self, ValidationError> {
        let field =
            ConfigField::from_key(key).ok_or_else(|| ValidationError::UnknownField(key.into()))?;
        Ok(self.set_raw(field, raw))
    }

    pub fn focus_duration(self, minutes: i64) -> Self {
        self.set(ConfigField::FocusDuration, minutes)
    }

    pub fn short_break_duration(self, minutes: i64) -> Self {
        self.set(ConfigField::ShortBreakDuration, minutes)
    }

    pub fn long_break_duration(self, minutes: i64) -> Self {
        self.set(ConfigField::LongBreakDuration, minutes)
    }

    pub fn pomodoros_until_long_break(self, count: i64) -> Self {
        self.set(ConfigField::PomodorosUntilLongBreak, count)
    }
}

/// Outcome of applying a [`ConfigurationUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationReport {
    pub accepted: Vec<ConfigField>,
    pub rejected: Vec<ValidationError>,
}

impl ConfigurationReport {
    pub fn is_accepted(&self, field: ConfigField) -> bool {
        self.accepted.contains(&field)
    }

    pub fn any_accepted(&self) -> bool {
        !self.accepted.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}
