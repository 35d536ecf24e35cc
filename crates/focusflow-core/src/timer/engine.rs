//! Pomodoro countdown engine.
//!
//! The engine keeps one countdown per mode and does not own a thread.
//! The caller drives it with `tick()` once per second, or with
//! `catch_up(now)` after restoring persisted state.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Active --pause--> Idle
//!                   |
//!                 tick (remaining hits 0)
//!                   v
//!               Completed (idle, remaining 0) --reset/switch--> Idle
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::mode::{Durations, PerMode, TimerMode};
use crate::error::ValidationError;
use crate::events::Event;

/// Core timer engine. Serializable so front ends can persist it between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEngine {
    mode: TimerMode,
    /// Remaining seconds, one countdown per mode.
    remaining: PerMode<u64>,
    durations: Durations,
    is_active: bool,
    /// Moment the last second was applied while active.
    #[serde(default)]
    last_tick_at: Option<DateTime<Utc>>,
    /// When the current countdown was first started.
    #[serde(default)]
    run_started_at: Option<DateTime<Utc>>,
    /// Focus seconds not yet flushed to the profile.
    #[serde(default)]
    time_studied_secs: u64,
    #[serde(default)]
    selected_task: Option<String>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

impl TimerEngine {
    /// Idle engine in Pomodoro mode with every countdown full.
    pub fn new(durations: Durations) -> Self {
        Self {
            mode: TimerMode::Pomodoro,
            remaining: full(&durations),
            durations,
            is_active: false,
            last_tick_at: None,
            run_started_at: None,
            time_studied_secs: 0,
            selected_task: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining.get(self.mode)
    }

    pub fn remaining_for(&self, mode: TimerMode) -> u64 {
        self.remaining.get(mode)
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn total_secs(&self) -> u64 {
        self.durations.secs(self.mode)
    }

    pub fn time_studied_secs(&self) -> u64 {
        self.time_studied_secs
    }

    pub fn selected_task(&self) -> Option<&str> {
        self.selected_task.as_deref()
    }

    pub fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        self.last_tick_at
    }

    /// Window title: the countdown while running, the app name otherwise.
    pub fn title(&self) -> String {
        if self.is_active {
            format!(
                "{} | {} - FocusFlow",
                format_time(self.remaining_secs()),
                self.mode.label()
            )
        } else {
            "FocusFlow: Pomodoro Scheduler".to_string()
        }
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            is_active: self.is_active,
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs(),
            time_studied_secs: self.time_studied_secs,
            selected_task: self.selected_task.clone(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(Utc::now())
    }

    /// Start counting down from `now`. No-op when already running or when
    /// the current countdown is spent.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.is_active || self.remaining_secs() == 0 {
            return None;
        }
        self.is_active = true;
        self.last_tick_at = Some(now);
        self.run_started_at.get_or_insert(now);
        tracing::debug!(mode = %self.mode, remaining = self.remaining_secs(), "timer started");
        Some(Event::TimerStarted {
            mode: self.mode,
            remaining_secs: self.remaining_secs(),
            task_id: self.selected_task.clone(),
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_active {
            return None;
        }
        self.is_active = false;
        self.last_tick_at = None;
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_secs: self.remaining_secs(),
            at: Utc::now(),
        })
    }

    pub fn toggle(&mut self) -> Option<Event> {
        self.toggle_at(Utc::now())
    }

    pub fn toggle_at(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.is_active {
            self.pause()
        } else {
            self.start_at(now)
        }
    }

    /// Apply one second. Returns `TimerCompleted` on the tick that reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        self.advance(1)
    }

    /// Apply every whole second elapsed since the last tick.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let last = self.last_tick_at.filter(|_| self.is_active)?;
        let elapsed = (now - last).num_seconds();
        if elapsed <= 0 {
            return None;
        }
        self.advance(elapsed as u64)
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.stop();
        let full = self.durations.secs(self.mode);
        *self.remaining.get_mut(self.mode) = full;
        Some(Event::TimerReset {
            mode: self.mode,
            remaining_secs: full,
            at: Utc::now(),
        })
    }

    pub fn switch_mode(&mut self, mode: TimerMode) -> Option<Event> {
        if mode == self.mode {
            return None;
        }
        let from = self.mode;
        self.stop();
        self.mode = mode;
        *self.remaining.get_mut(mode) = self.durations.secs(mode);
        Some(Event::ModeSwitched {
            from,
            to: mode,
            at: Utc::now(),
        })
    }

    pub fn set_duration(&mut self, mode: TimerMode, minutes: u32) -> Result<Event, ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: "minutes must be at least 1".into(),
            });
        }
        *self.durations.get_mut(mode) = minutes;
        *self.remaining.get_mut(mode) = self.durations.secs(mode);
        if mode == self.mode {
            self.run_started_at = None;
        }
        Ok(Event::DurationChanged {
            mode,
            minutes,
            at: Utc::now(),
        })
    }

    /// Replace all durations at once. Countdowns keep their current values.
    pub fn set_durations(&mut self, durations: Durations) {
        self.durations = durations;
    }

    pub fn select_task(&mut self, task_id: Option<String>) {
        self.selected_task = task_id;
    }

    /// Drain the focus seconds accumulated since the last call.
    pub fn take_time_studied(&mut self) -> u64 {
        std::mem::take(&mut self.time_studied_secs)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn stop(&mut self) {
        self.is_active = false;
        self.last_tick_at = None;
        self.run_started_at = None;
    }

    fn advance(&mut self, secs: u64) -> Option<Event> {
        if !self.is_active {
            return None;
        }
        let remaining = self.remaining.get_mut(self.mode);
        let applied = secs.min(*remaining);
        *remaining -= applied;
        let now_zero = *remaining == 0;

        if self.mode.is_focus() {
            self.time_studied_secs += applied;
        }
        let at = match self.last_tick_at {
            Some(last) => last + Duration::seconds(applied as i64),
            None => Utc::now(),
        };
        self.last_tick_at = Some(at);

        if !now_zero {
            return None;
        }
        let started_at = self
            .run_started_at
            .unwrap_or_else(|| at - Duration::seconds(self.total_secs() as i64));
        self.stop();
        tracing::info!(mode = %self.mode, "timer completed");
        Some(Event::TimerCompleted {
            mode: self.mode,
            duration_secs: self.total_secs(),
            task_id: self.selected_task.clone(),
            started_at,
            at,
        })
    }
}

fn full(durations: &Durations) -> PerMode<u64> {
    PerMode {
        pomodoro: durations.secs(TimerMode::Pomodoro),
        short_break: durations.secs(TimerMode::ShortBreak),
        long_break: durations.secs(TimerMode::LongBreak),
    }
}

/// Render seconds as `MM:SS`.
pub fn format_time(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
    }

    fn short() -> Durations {
        Durations {
            pomodoro: 1,
            short_break: 1,
            long_break: 2,
        }
    }

    #[test]
    fn start_pause_toggle() {
        let mut engine = TimerEngine::default();
        assert!(!engine.is_active());

        assert!(engine.start().is_some());
        assert!(engine.is_active());
        assert!(engine.start().is_none());

        assert!(engine.pause().is_some());
        assert!(!engine.is_active());
        assert!(engine.pause().is_none());

        assert!(matches!(engine.toggle(), Some(Event::TimerStarted { .. })));
        assert!(matches!(engine.toggle(), Some(Event::TimerPaused { .. })));
    }

    #[test]
    fn tick_only_counts_while_active() {
        let mut engine = TimerEngine::default();
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 1500);

        engine.start_at(t0());
        engine.tick();
        engine.tick();
        assert_eq!(engine.remaining_secs(), 1498);
        assert_eq!(engine.time_studied_secs(), 2);
    }

    #[test]
    fn breaks_do_not_count_as_studied() {
        let mut engine = TimerEngine::default();
        engine.switch_mode(TimerMode::ShortBreak);
        engine.start_at(t0());
        engine.tick();
        assert_eq!(engine.remaining_secs(), 299);
        assert_eq!(engine.time_studied_secs(), 0);
    }

    #[test]
    fn countdown_completes_and_stops() {
        let mut engine = TimerEngine::new(short());
        engine.select_task(Some("t1".into()));
        engine.start_at(t0());
        for _ in 0..59 {
            assert!(engine.tick().is_none());
        }
        match engine.tick() {
            Some(Event::TimerCompleted {
                mode,
                duration_secs,
                task_id,
                started_at,
                at,
            }) => {
                assert_eq!(mode, TimerMode::Pomodoro);
                assert_eq!(duration_secs, 60);
                assert_eq!(task_id.as_deref(), Some("t1"));
                assert_eq!(started_at, t0());
                assert_eq!(at, t0() + Duration::seconds(60));
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(!engine.is_active());
        assert_eq!(engine.remaining_secs(), 0);
        assert!(engine.tick().is_none());
        assert!(engine.start().is_none());
    }

    #[test]
    fn catch_up_applies_elapsed_seconds() {
        let mut engine = TimerEngine::default();
        engine.start_at(t0());
        assert!(engine.catch_up(t0() + Duration::seconds(90)).is_none());
        assert_eq!(engine.remaining_secs(), 1410);
        assert_eq!(engine.time_studied_secs(), 90);
        assert_eq!(engine.last_tick_at(), Some(t0() + Duration::seconds(90)));
    }

    #[test]
    fn catch_up_stops_at_completion() {
        let mut engine = TimerEngine::new(short());
        engine.start_at(t0());
        let ev = engine.catch_up(t0() + Duration::hours(3));
        assert!(matches!(ev, Some(Event::TimerCompleted { at, .. }) if at == t0() + Duration::seconds(60)));
        assert_eq!(engine.time_studied_secs(), 60);
        assert!(engine.catch_up(t0() + Duration::hours(4)).is_none());
    }

    #[test]
    fn catch_up_ignores_paused_and_backwards_clocks() {
        let mut engine = TimerEngine::default();
        assert!(engine.catch_up(t0()).is_none());
        engine.start_at(t0());
        assert!(engine.catch_up(t0() - Duration::seconds(30)).is_none());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn reset_refills_current_mode() {
        let mut engine = TimerEngine::default();
        engine.start_at(t0());
        engine.catch_up(t0() + Duration::seconds(100));
        engine.reset();
        assert!(!engine.is_active());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn switching_mode_stops_and_refills() {
        let mut engine = TimerEngine::default();
        engine.start_at(t0());
        engine.tick();
        assert!(engine.switch_mode(TimerMode::Pomodoro).is_none());
        assert!(engine.is_active());

        let ev = engine.switch_mode(TimerMode::LongBreak);
        assert!(matches!(ev, Some(Event::ModeSwitched { from: TimerMode::Pomodoro, to: TimerMode::LongBreak, .. })));
        assert!(!engine.is_active());
        assert_eq!(engine.remaining_secs(), 900);
        // The pomodoro countdown keeps its own value.
        assert_eq!(engine.remaining_for(TimerMode::Pomodoro), 1499);
    }

    #[test]
    fn set_duration_validates_and_resets_countdown() {
        let mut engine = TimerEngine::default();
        assert!(engine.set_duration(TimerMode::ShortBreak, 0).is_err());
        engine.set_duration(TimerMode::ShortBreak, 10).unwrap();
        assert_eq!(engine.durations().short_break, 10);
        assert_eq!(engine.remaining_for(TimerMode::ShortBreak), 600);
    }

    #[test]
    fn title_reflects_running_state() {
        let mut engine = TimerEngine::default();
        assert_eq!(engine.title(), "FocusFlow: Pomodoro Scheduler");
        engine.start_at(t0());
        engine.tick();
        assert_eq!(engine.title(), "24:59 | Focus - FocusFlow");
    }

    #[test]
    fn format_time_pads() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(1500), "25:00");
    }

    #[test]
    fn take_time_studied_drains() {
        let mut engine = TimerEngine::default();
        engine.start_at(t0());
        engine.catch_up(t0() + Duration::seconds(10));
        assert_eq!(engine.take_time_studied(), 10);
        assert_eq!(engine.take_time_studied(), 0);
    }

    #[test]
    fn survives_json_roundtrip() {
        let mut engine = TimerEngine::default();
        engine.select_task(Some("abc".into()));
        engine.start_at(t0());
        let json = serde_json::to_string(&engine).unwrap();
        let restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, engine);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = TimerEngine::default();
        match engine.snapshot() {
            Event::StateSnapshot {
                mode,
                is_active,
                remaining_secs,
                total_secs,
                ..
            } => {
                assert_eq!(mode, TimerMode::Pomodoro);
                assert!(!is_active);
                assert_eq!(remaining_secs, 1500);
                assert_eq!(total_secs, 1500);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
