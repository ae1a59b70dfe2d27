use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ConfigField, TimerMode};

/// Every state change in the timer produces an Event.
/// The presentation layer renders from them; collaborators subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: TimerMode,
        to: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: TimerMode,
        at: DateTime<Utc>,
    },
    Ticked {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero while running.
    IntervalCompleted {
        finished: TimerMode,
        next: TimerMode,
        completed_focus_sessions: u32,
        at: DateTime<Utc>,
    },
    /// A Focus interval was completed. Fired exactly once per Focus completion.
    PomodoroComplete {
        at: DateTime<Utc>,
    },
    ConfigurationUpdated {
        accepted: Vec<ConfigField>,
        reseeded: bool,
        at: DateTime<Utc>,
    },
    SessionCountReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: TimerMode,
        remaining_secs: u64,
        total_secs: u64,
        is_running: bool,
        completed_focus_sessions: u32,
        clock: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerReset { at, .. }
            | Event::ModeSwitched { at, .. }
            | Event::TimerSkipped { at, .. }
            | Event::Ticked { at, .. }
            | Event::IntervalCompleted { at, .. }
            | Event::PomodoroComplete { at }
            | Event::ConfigurationUpdated { at, .. }
            | Event::SessionCountReset { at }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }

    pub fn is_pomodoro_complete(&self) -> bool {
        matches!(self, Event::PomodoroComplete { .. })
    }
}
