//! Timer engine implementation.
//!
//! The engine is a pure state machine. It has no thread and no clock of its
//! own: the tick driver calls `tick()` once per elapsed second while the
//! timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! (mode, paused) --start--> (mode, running) --pause--> (mode, paused)
//! (any)          --reset/switch_mode/skip-->            (mode', paused, full duration)
//! (mode, running) --tick at zero--> (next mode, paused, full duration)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfiguration::default());
//! engine.start();
//! // Once per second:
//! let events = engine.tick(); // contains IntervalCompleted when the countdown ends
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{ConfigurationReport, ConfigurationUpdate, TimerConfiguration};
use super::display::format_clock;
use super::mode::TimerMode;
use crate::events::Event;

/// The mutable session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub remaining_secs: u64,
    pub is_running: bool,
    /// Only ever increases, except through an explicit session count reset.
    pub completed_focus_sessions: u32,
}

impl TimerState {
    fn new(config: &TimerConfiguration) -> Self {
        Self {
            mode: TimerMode::Focus,
            remaining_secs: config.duration_secs(TimerMode::Focus),
            is_running: false,
            completed_focus_sessions: 0,
        }
    }
}

/// Core timer engine.
///
/// Only built through [`new`](Self::new), so the configuration is always
/// in range and the countdown never exceeds the mode's duration.
#[derive(Debug, Clone, Serialize)]
pub struct TimerEngine {
    config: TimerConfiguration,
    state: TimerState,
}

impl TimerEngine {
    /// Create an engine paused in Focus mode with the full focus duration.
    pub fn new(config: TimerConfiguration) -> Self {
        let config = config.sanitized();
        Self {
            state: TimerState::new(&config),
            config,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn completed_focus_sessions(&self) -> u32 {
        self.state.completed_focus_sessions
    }

    pub fn configuration(&self) -> &TimerConfiguration {
        &self.config
    }

    /// Skipping is only meaningful during a break.
    pub fn can_skip(&self) -> bool {
        self.state.mode.is_break()
    }

    /// Full length of the current mode in seconds.
    pub fn total_secs(&self) -> u64 {
        self.config.duration_secs(self.state.mode)
    }

    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        format_clock(self.state.remaining_secs)
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.state.remaining_secs.min(total) as f64 / total as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            total_secs: self.total_secs(),
            is_running: self.state.is_running,
            completed_focus_sessions: self.state.completed_focus_sessions,
            clock: self.clock(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state.is_running = true;
        debug!(mode = ?self.state.mode, remaining = self.state.remaining_secs, "timer started");
        Some(Event::TimerStarted {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        debug!(remaining = self.state.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.reseed(self.state.mode);
        Some(Event::TimerReset {
            mode: self.state.mode,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop and load the full duration of `mode`. An in-flight countdown is discarded.
    pub fn switch_mode(&mut self, mode: TimerMode) -> Option<Event> {
        let from = self.state.mode;
        self.reseed(mode);
        debug!(?from, to = ?mode, "mode switched");
        Some(Event::ModeSwitched {
            from,
            to: mode,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Abandon the current break and return to Focus. No-op during Focus.
    pub fn skip(&mut self) -> Option<Event> {
        if !self.can_skip() {
            return None;
        }
        let from = self.state.mode;
        self.reseed(TimerMode::Focus);
        Some(Event::TimerSkipped {
            from,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Returns nothing while paused. When the countdown reaches zero the
    /// completion events follow the tick event.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if !self.state.is_running {
            return events;
        }
        if self.state.remaining_secs > 0 {
            self.state.remaining_secs -= 1;
            events.push(Event::Ticked {
                mode: self.state.mode,
                remaining_secs: self.state.remaining_secs,
                at: Utc::now(),
            });
        }
        if self.state.remaining_secs == 0 {
            self.complete(&mut events);
        }
        events
    }

    /// Apply a partial configuration change.
    ///
    /// If the active mode's duration was accepted and the timer is paused,
    /// the countdown is reseeded. A running countdown is never touched.
    pub fn update_configuration(
        &mut self,
        update: &ConfigurationUpdate,
    ) -> (ConfigurationReport, Option<Event>) {
        let report = self.config.apply(update);
        if !report.any_accepted() {
            return (report, None);
        }
        let reseeded = !self.state.is_running && report.is_accepted(self.state.mode.duration_field());
        if reseeded {
            self.state.remaining_secs = self.total_secs();
        }
        debug!(accepted = ?report.accepted, reseeded, "configuration updated");
        let event = Event::ConfigurationUpdated {
            accepted: report.accepted.clone(),
            reseeded,
            at: Utc::now(),
        };
        (report, Some(event))
    }

    /// Zero the completed Focus counter. Driven by a collaborator, never by
    /// the engine's own transitions.
    pub fn reset_completed_sessions(&mut self) -> Option<Event> {
        self.state.completed_focus_sessions = 0;
        Some(Event::SessionCountReset { at: Utc::now() })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reseed(&mut self, mode: TimerMode) {
        self.state.is_running = false;
        self.state.mode = mode;
        self.state.remaining_secs = self.config.duration_secs(mode);
    }

    fn next_mode_after(&self, finished: TimerMode) -> TimerMode {
        if finished.is_break() {
            return TimerMode::Focus;
        }
        let every = self.config.pomodoros_until_long_break().max(1);
        if self.state.completed_focus_sessions % every == 0 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        }
    }

    fn complete(&mut self, events: &mut Vec<Event>) {
        let finished = self.state.mode;
        self.state.is_running = false;
        if finished == TimerMode::Focus {
            self.state.completed_focus_sessions = self.state.completed_focus_sessions.saturating_add(1);
            events.push(Event::PomodoroComplete { at: Utc::now() });
        }
        let next = self.next_mode_after(finished);
        self.reseed(next);
        info!(
            ?finished,
            ?next,
            completed = self.state.completed_focus_sessions,
            "interval completed"
        );
        events.push(Event::IntervalCompleted {
            finished,
            next,
            completed_focus_sessions: self.state.completed_focus_sessions,
            at: Utc::now(),
        });
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerConfiguration::default())
    }
}
