//! Terminal implementations of the core sinks.

use std::io::{IsTerminal, Write};

use focustimer_core::{Notification, NotificationSink, SinkError, TimerMode, TitleSink};

/// Rings the terminal bell and prints a banner on stderr.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl NotificationSink for TerminalNotifier {
    fn play_sound(&self, _finished: TimerMode) -> Result<(), SinkError> {
        let mut out = std::io::stdout();
        if !out.is_terminal() {
            return Err(SinkError::Unavailable("terminal bell"));
        }
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }

    fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let mut err = std::io::stderr();
        writeln!(err, "\n*** {}: {} ***", notification.title, notification.body)?;
        Ok(())
    }
}

/// Sets the terminal window title through an OSC 0 escape sequence.
#[derive(Debug)]
pub struct TerminalTitle {
    enabled: bool,
}

impl TerminalTitle {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: enabled && std::io::stdout().is_terminal(),
        }
    }
}

impl TitleSink for TerminalTitle {
    fn set_title(&self, title: &str) {
        if !self.enabled {
            return;
        }
        let mut out = std::io::stdout();
        // Title updates are cosmetic.
        let _ = write!(out, "\x1b]0;{title}\x07").and_then(|_| out.flush());
    }
}
