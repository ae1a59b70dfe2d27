//! Tick driver and side-effect dispatcher around a [`TimerEngine`].
//!
//! `TimerSession` is a cheap, clonable handle. It owns the engine, the
//! injected sinks and the handle of the background task that ticks the
//! engine once per second while it runs.
//!
//! Every transition that stops the countdown cancels the tick task and bumps
//! the driver generation under the same lock that guards the engine. A tick
//! that was already in flight sees a stale generation and is dropped, so it
//! can never decrement a freshly reseeded countdown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::events::Event;
use crate::sink::{NoopNotifier, NoopTitle, Notification, NotificationSink, TitleSink};
use crate::storage::{Config, MemorySettingsStore, SettingsStore};
use crate::timer::{
    window_title, ConfigurationReport, ConfigurationUpdate, TimerConfiguration, TimerEngine,
    TimerMode, TimerState,
};

const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Runtime knobs for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Shown after the mode label in the window title.
    pub app_name: String,
    /// Raise a system notification on completion.
    pub notifications_enabled: bool,
    /// Play the alert sound on completion.
    pub sound_enabled: bool,
    pub tick_interval: Duration,
    pub event_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            app_name: "Focus Timer".into(),
            notifications_enabled: true,
            sound_enabled: true,
            tick_interval: Duration::from_secs(1),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_name: config.ui.app_name.clone(),
            notifications_enabled: config.notifications.enabled,
            sound_enabled: config.notifications.sound,
            ..Self::default()
        }
    }
}

struct TickHandle {
    generation: u64,
    task: JoinHandle<()>,
}

struct Inner {
    engine: TimerEngine,
    driver: Option<TickHandle>,
    generation: u64,
}

impl Inner {
    /// Invalidate any scheduled tick. Must run before the countdown is reseeded.
    fn cancel_driver(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(driver) = self.driver.take() {
            debug!(generation = driver.generation, "tick driver cancelled");
            driver.task.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.task.abort();
        }
    }
}

struct Shared {
    state: Mutex<Inner>,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn NotificationSink>,
    title: Arc<dyn TitleSink>,
    events: broadcast::Sender<Event>,
    options: SessionOptions,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn title_for(&self, engine: &TimerEngine) -> String {
        window_title(engine.remaining_secs(), engine.mode(), &self.options.app_name)
    }

    /// Apply one tick from the driver of `generation`.
    /// Returns whether the driver should keep going.
    fn apply_tick(&self, generation: u64) -> bool {
        let (events, title, running) = {
            let mut inner = self.lock();
            if inner.generation != generation || !inner.engine.is_running() {
                debug!(generation, "stale tick dropped");
                return false;
            }
            let events = inner.engine.tick();
            let running = inner.engine.is_running();
            if !running {
                // Completion: this task is the driver, let it finish on its own.
                inner.generation = inner.generation.wrapping_add(1);
                inner.driver = None;
            }
            (events, self.title_for(&inner.engine), running)
        };
        self.title.set_title(&title);
        self.dispatch(events);
        running
    }

    fn dispatch(&self, events: Vec<Event>) {
        for event in events {
            if let Event::IntervalCompleted { finished, next, .. } = &event {
                self.alert(*finished, *next);
            }
            self.publish(event);
        }
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Sound and notification for a finished interval. Failures are logged only.
    fn alert(&self, finished: TimerMode, next: TimerMode) {
        if self.options.sound_enabled {
            if let Err(e) = self.notifier.play_sound(finished) {
                warn!(?finished, "alert sound failed: {e}");
            }
        }
        if self.options.notifications_enabled {
            let notification = Notification::interval_finished(finished, next);
            if let Err(e) = self.notifier.notify(&notification) {
                warn!(?finished, "system notification failed: {e}");
            }
        }
    }
}

async fn tick_loop(shared: Weak<Shared>, generation: u64, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let Some(strong) = shared.upgrade() else {
            break;
        };
        if !strong.apply_tick(generation) {
            break;
        }
    }
    debug!(generation, "tick driver finished");
}

/// A running timer: engine, tick driver, sinks and settings store.
#[derive(Clone)]
pub struct TimerSession {
    shared: Arc<Shared>,
}

impl TimerSession {
    /// Build a session, reading the timer configuration from `store`.
    ///
    /// An unreadable store falls back to the defaults (25/5/30/3).
    pub fn new(
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn NotificationSink>,
        title: Arc<dyn TitleSink>,
        options: SessionOptions,
    ) -> Self {
        let config = store.load().unwrap_or_else(|e| {
            warn!("could not load timer settings, using defaults: {e}");
            TimerConfiguration::default()
        });
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        let shared = Arc::new(Shared {
            state: Mutex::new(Inner {
                engine: TimerEngine::new(config),
                driver: None,
                generation: 0,
            }),
            store,
            notifier,
            title,
            events,
            options,
        });
        let session = Self { shared };
        session.refresh_title();
        session
    }

    /// Session with an in-memory store and no-op sinks.
    pub fn in_memory(config: TimerConfiguration) -> Self {
        Self::new(
            Arc::new(MemorySettingsStore::with_config(config)),
            Arc::new(NoopNotifier),
            Arc::new(NoopTitle),
            SessionOptions::default(),
        )
    }

    /// Receive every event the session produces.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        *self.shared.lock().engine.state()
    }

    pub fn mode(&self) -> TimerMode {
        self.shared.lock().engine.mode()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.shared.lock().engine.remaining_secs()
    }

    /// Remaining time as `MM:SS`.
    pub fn clock(&self) -> String {
        self.shared.lock().engine.clock()
    }

    pub fn title(&self) -> String {
        let inner = self.shared.lock();
        self.shared.title_for(&inner.engine)
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().engine.is_running()
    }

    pub fn completed_focus_sessions(&self) -> u32 {
        self.shared.lock().engine.completed_focus_sessions()
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        self.shared.lock().engine.progress()
    }

    pub fn can_skip(&self) -> bool {
        self.shared.lock().engine.can_skip()
    }

    pub fn configuration(&self) -> TimerConfiguration {
        *self.shared.lock().engine.configuration()
    }

    pub fn snapshot(&self) -> Event {
        self.shared.lock().engine.snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. No-op if already running.
    ///
    /// Must be called from within a tokio runtime; otherwise the timer stays
    /// paused and a warning is logged.
    pub fn start(&self) -> Option<Event> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("cannot start timer without a tokio runtime: {e}");
                return None;
            }
        };
        let (event, title) = {
            let mut inner = self.shared.lock();
            let event = inner.engine.start()?;
            inner.cancel_driver();
            let generation = inner.generation;
            let task = handle.spawn(tick_loop(
                Arc::downgrade(&self.shared),
                generation,
                self.shared.options.tick_interval,
            ));
            inner.driver = Some(TickHandle { generation, task });
            debug!(generation, "tick driver started");
            (event, self.shared.title_for(&inner.engine))
        };
        self.shared.title.set_title(&title);
        self.shared.publish(event.clone());
        Some(event)
    }

    pub fn pause(&self) -> Option<Event> {
        self.command(TimerEngine::pause)
    }

    pub fn reset(&self) -> Option<Event> {
        self.command(TimerEngine::reset)
    }

    pub fn switch_mode(&self, mode: TimerMode) -> Option<Event> {
        self.command(|engine| engine.switch_mode(mode))
    }

    pub fn skip(&self) -> Option<Event> {
        self.command(TimerEngine::skip)
    }

    /// Start when paused, pause when running.
    pub fn toggle(&self) -> Option<Event> {
        if self.is_running() {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset_completed_sessions(&self) -> Option<Event> {
        self.command(TimerEngine::reset_completed_sessions)
    }

    /// Apply a partial configuration update and persist what was accepted.
    ///
    /// Rejected fields keep their previous value. Persistence failures are
    /// logged and otherwise ignored.
    pub fn update_configuration(&self, update: &ConfigurationUpdate) -> ConfigurationReport {
        let (report, event, config, title) = {
            let mut inner = self.shared.lock();
            let (report, event) = inner.engine.update_configuration(update);
            let config = *inner.engine.configuration();
            (report, event, config, self.shared.title_for(&inner.engine))
        };
        for rejected in &report.rejected {
            info!("setting rejected: {rejected}");
        }
        if report.any_accepted() {
            if let Err(e) = self.shared.store.save(&config) {
                warn!("failed to persist timer settings: {e}");
            }
        }
        self.shared.title.set_title(&title);
        if let Some(event) = event {
            self.shared.publish(event);
        }
        report
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn command(&self, f: impl FnOnce(&mut TimerEngine) -> Option<Event>) -> Option<Event> {
        let (event, title) = {
            let mut inner = self.shared.lock();
            let event = f(&mut inner.engine);
            if !inner.engine.is_running() {
                inner.cancel_driver();
            }
            (event, self.shared.title_for(&inner.engine))
        };
        self.shared.title.set_title(&title);
        if let Some(event) = &event {
            self.shared.publish(event.clone());
        }
        event
    }

    fn refresh_title(&self) {
        let title = self.title();
        self.shared.title.set_title(&title);
    }
}

impl std::fmt::Debug for TimerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("TimerSession")
            .field("state", inner.engine.state())
            .field("generation", &inner.generation)
            .field("driver_active", &inner.driver.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use tokio::sync::broadcast::error::TryRecvError;

    #[derive(Default)]
    struct RecordingNotifier {
        sounds: Mutex<Vec<TimerMode>>,
        notes: Mutex<Vec<Notification>>,
        fail: bool,
    }

    impl NotificationSink for RecordingNotifier {
        fn play_sound(&self, finished: TimerMode) -> Result<(), SinkError> {
            self.sounds.lock().unwrap().push(finished);
            if self.fail {
                return Err(SinkError::Unavailable("audio"));
            }
            Ok(())
        }

        fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
            self.notes.lock().unwrap().push(notification.clone());
            if self.fail {
                return Err(SinkError::PermissionDenied("notifications"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingTitle(Mutex<Vec<String>>);

    impl TitleSink for RecordingTitle {
        fn set_title(&self, title: &str) {
            self.0.lock().unwrap().push(title.to_string());
        }
    }

    struct Fixture {
        session: TimerSession,
        store: Arc<MemorySettingsStore>,
        notifier: Arc<RecordingNotifier>,
        title: Arc<RecordingTitle>,
    }

    fn fixture_with(notifier: RecordingNotifier, options: SessionOptions) -> Fixture {
        let store = Arc::new(MemorySettingsStore::new());
        let notifier = Arc::new(notifier);
        let title = Arc::new(RecordingTitle::default());
        let session = TimerSession::new(store.clone(), notifier.clone(), title.clone(), options);
        Fixture {
            session,
            store,
            notifier,
            title,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::default(), SessionOptions::default())
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(ev) => out.push(ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second_while_running() {
        let f = fixture();
        f.session.start();
        wait(3_500).await;
        assert_eq!(f.session.remaining_secs(), 1497);
        assert!(f.session.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_does_not_double_tick() {
        let f = fixture();
        assert!(f.session.start().is_some());
        assert!(f.session.start().is_none());
        wait(3_500).await;
        assert_eq!(f.session.remaining_secs(), 1497);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticks() {
        let f = fixture();
        f.session.start();
        wait(2_500).await;
        f.session.pause();
        wait(10_000).await;
        assert_eq!(f.session.remaining_secs(), 1498);
        assert!(!f.session.is_running());

        f.session.start();
        wait(1_500).await;
        assert_eq!(f.session.remaining_secs(), 1497);
    }

    #[tokio::test(start_paused = true)]
    async fn no_stale_tick_after_switch_or_reset() {
        let f = fixture();
        f.session.start();
        wait(2_500).await;
        f.session.switch_mode(TimerMode::ShortBreak);
        wait(5_000).await;
        assert_eq!(f.session.remaining_secs(), 300);
        assert!(!f.session.is_running());

        f.session.start();
        wait(1_500).await;
        f.session.reset();
        wait(5_000).await;
        assert_eq!(f.session.clock(), "05:00");
    }

    #[tokio::test(start_paused = true)]
    async fn focus_completion_notifies_and_transitions() {
        let f = fixture();
        let mut rx = f.session.subscribe();
        f.session.start();
        wait(1_500_500).await;

        assert_eq!(f.session.completed_focus_sessions(), 1);
        assert_eq!(f.session.mode(), TimerMode::ShortBreak);
        assert_eq!(f.session.remaining_secs(), 300);
        assert!(!f.session.is_running());

        assert_eq!(*f.notifier.sounds.lock().unwrap(), vec![TimerMode::Focus]);
        let notes = f.notifier.notes.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Focus complete");

        let events = drain(&mut rx);
        assert_eq!(events.iter().filter(|e| e.is_pomodoro_complete()).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn break_completion_has_no_pomodoro_event() {
        let f = fixture();
        f.session.switch_mode(TimerMode::ShortBreak);
        let mut rx = f.session.subscribe();
        f.session.start();
        wait(300_500).await;
        assert_eq!(f.session.mode(), TimerMode::Focus);
        assert_eq!(f.session.completed_focus_sessions(), 0);
        assert!(!drain(&mut rx).iter().any(Event::is_pomodoro_complete));
        assert_eq!(f.notifier.notes.lock().unwrap()[0].finished, TimerMode::ShortBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failures_do_not_block_completion() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let f = fixture_with(notifier, SessionOptions::default());
        f.session.switch_mode(TimerMode::ShortBreak);
        f.session.start();
        wait(300_500).await;
        assert_eq!(f.session.mode(), TimerMode::Focus);
        assert_eq!(f.notifier.sounds.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_notifications_are_skipped() {
        let options = SessionOptions {
            notifications_enabled: false,
            sound_enabled: false,
            ..Default::default()
        };
        let f = fixture_with(RecordingNotifier::default(), options);
        f.session.switch_mode(TimerMode::ShortBreak);
        f.session.start();
        wait(300_500).await;
        assert_eq!(f.session.mode(), TimerMode::Focus);
        assert!(f.notifier.sounds.lock().unwrap().is_empty());
        assert!(f.notifier.notes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn title_follows_ticks() {
        let f = fixture();
        assert_eq!(
            f.title.0.lock().unwrap().last().map(String::as_str),
            Some("25:00 - Focus | Focus Timer")
        );
        f.session.start();
        wait(1_500).await;
        assert_eq!(
            f.title.0.lock().unwrap().last().map(String::as_str),
            Some("24:59 - Focus | Focus Timer")
        );
    }

    #[tokio::test]
    async fn accepted_update_is_persisted() {
        let f = fixture();
        let report = f
            .session
            .update_configuration(&ConfigurationUpdate::new().focus_duration(40).short_break_duration(0));
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(f.store.save_count(), 1);
        assert_eq!(f.store.stored().map(|c| c.focus_duration()), Some(40));
        assert_eq!(f.store.stored().map(|c| c.short_break_duration()), Some(5));
        assert_eq!(f.session.clock(), "40:00");
    }

    #[tokio::test]
    async fn rejected_update_is_not_persisted() {
        let f = fixture();
        f.session
            .update_configuration(&ConfigurationUpdate::new().focus_duration(0));
        assert_eq!(f.store.save_count(), 0);
        assert_eq!(f.session.configuration().focus_duration(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn update_while_running_keeps_countdown() {
        let f = fixture();
        f.session.start();
        wait(1_500).await;
        f.session
            .update_configuration(&ConfigurationUpdate::new().focus_duration(50));
        assert_eq!(f.session.remaining_secs(), 1499);
        wait(1_000).await;
        assert_eq!(f.session.remaining_secs(), 1498);
    }

    #[test]
    fn start_without_runtime_stays_paused() {
        let session = TimerSession::in_memory(TimerConfiguration::default());
        assert!(session.start().is_none());
        assert!(!session.is_running());
    }

    #[test]
    fn toggle_and_skip_without_driver() {
        let session = TimerSession::in_memory(TimerConfiguration::default());
        assert!(!session.can_skip());
        session.switch_mode(TimerMode::LongBreak);
        assert!(session.can_skip());
        assert!(session.skip().is_some());
        assert_eq!(session.mode(), TimerMode::Focus);
    }
}
