mod config;
pub mod display;
mod engine;
mod mode;

pub use config::{
    ConfigField, ConfigurationReport, ConfigurationUpdate, SettingInput, TimerConfiguration,
    MAX_DURATION_MIN, MAX_POMODOROS_UNTIL_LONG_BREAK, MIN_DURATION_MIN,
    MIN_POMODOROS_UNTIL_LONG_BREAK,
};
pub use display::{format_clock, window_title};
pub use engine::{TimerEngine, TimerState};
pub use mode::TimerMode;
