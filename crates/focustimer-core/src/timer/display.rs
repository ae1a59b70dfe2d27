//! Text derived from the timer state for the presentation layer.

use super::mode::TimerMode;

/// `MM:SS`, zero padded. Minutes are not capped, so 120 minutes is `120:00`.
pub fn format_clock(remaining_secs: u64) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// Window or tab title: `"MM:SS - <Mode> | <App>"`.
pub fn window_title(remaining_secs: u64, mode: TimerMode, app_name: &str) -> String {
    format!("{} - {} | {}", format_clock(remaining_secs), mode.label(), app_name)
}
