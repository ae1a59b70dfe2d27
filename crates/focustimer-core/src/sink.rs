//! Output capabilities injected into a [`TimerSession`](crate::TimerSession).
//!
//! The engine never talks to the OS directly. Whatever renders sounds,
//! desktop notifications or window titles implements these traits.

use crate::error::SinkError;
use crate::timer::TimerMode;

/// A system-level notification for a finished interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub finished: TimerMode,
}

impl Notification {
    /// Describe the end of `finished`, pointing at what comes next.
    pub fn interval_finished(finished: TimerMode, next: TimerMode) -> Self {
        let body = match next {
            TimerMode::Focus => "Break is over. Time to focus.".to_string(),
            other => format!("Time for a {}.", other.label().to_lowercase()),
        };
        Self {
            title: format!("{} complete", finished.label()),
            body,
            finished,
        }
    }
}

/// Audible cue and desktop notification on completion.
///
/// Both calls are best-effort. Errors are logged by the session and never
/// interrupt the mode transition.
pub trait NotificationSink: Send + Sync {
    /// Play a short alert sound.
    fn play_sound(&self, finished: TimerMode) -> Result<(), SinkError>;

    /// Raise a system notification.
    fn notify(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// Receives the window/tab title derived from the countdown.
pub trait TitleSink: Send + Sync {
    fn set_title(&self, title: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn play_sound(&self, _finished: TimerMode) -> Result<(), SinkError> {
        Ok(())
    }

    fn notify(&self, _notification: &Notification) -> Result<(), SinkError> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTitle;

impl TitleSink for NoopTitle {
    fn set_title(&self, _title: &str) {}
}
