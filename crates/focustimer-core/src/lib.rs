//! # Focus Timer Core Library
//!
//! This library provides the core logic of a Pomodoro-style focus timer.
//! A CLI is the reference presentation layer; any other front end drives the
//! same [`TimerSession`].
//!
//! ## Architecture
//!
//! - **Timer Engine**: A pure state machine over mode, remaining seconds,
//!   running flag and completed focus sessions
//! - **Session**: Owns the engine, drives `tick()` once per second from a
//!   cancellable tokio task and dispatches completion side effects
//! - **Sinks**: Injected capabilities for sounds, system notifications and
//!   window titles
//! - **Storage**: TOML-based settings record
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerSession`]: Tick driver and event broadcaster
//! - [`Config`]: Application configuration management
//! - [`NotificationSink`]: Trait for completion alerts

pub mod error;
pub mod events;
pub mod session;
pub mod sink;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, SinkError, ValidationError};
pub use events::Event;
pub use session::{SessionOptions, TimerSession};
pub use sink::{NoopNotifier, NoopTitle, Notification, NotificationSink, TitleSink};
pub use storage::{Config, MemorySettingsStore, SettingsStore, TomlSettingsStore};
pub use timer::{
    ConfigField, ConfigurationReport, ConfigurationUpdate, TimerConfiguration, TimerEngine,
    TimerMode, TimerState,
};
