//! Focus session engine.
//!
//! A pure state machine: it owns the countdown/stopwatch counters and the
//! binding to the task being focused on, but no clock. Every call to
//! [`SessionEngine::tick`] advances the active counter by one second; the
//! [`FocusTimer`](super::FocusTimer) driver calls it once per second while the
//! session is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start_focus(a)--> Running(a) <--toggle--> Paused(a)
//!   ^                          |                      |
//!   +-------- stop_focus ------+----------------------+
//! ```
//!
//! `start_focus` on the bound task toggles between running and paused;
//! on any other task it rebinds and restarts the countdown from full.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

/// Which counter the session advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Count down from the configured focus duration.
    #[default]
    Timer,
    /// Count up without bound.
    Stopwatch,
}

/// Coarse session state derived from binding and running flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No bound task, not running.
    Idle,
    /// Task bound, not ticking.
    Paused,
    /// Task bound and ticking.
    Running,
}

/// Identity and title snapshot of the task the session is bound to.
///
/// The task list owns the task; this is only a reference by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundTask {
    pub id: String,
    pub title: String,
}

/// Core session engine.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    mode: TimerMode,
    bound: Option<BoundTask>,
    running: bool,
    remaining_secs: u64,
    elapsed_secs: u64,
    focus_minutes: u32,
    /// Seconds counted down since the countdown last started from full.
    timer_ticks: u64,
    /// A duration change arrived while it could not be applied; applied the
    /// next time the session is paused in timer mode.
    resync_pending: bool,
}

impl SessionEngine {
    /// Create an idle engine in timer mode with a full countdown.
    pub fn new(focus_minutes: u32) -> Result<Self, ValidationError> {
        if focus_minutes == 0 {
            return Err(ValidationError::InvalidDuration);
        }
        Ok(Self {
            mode: TimerMode::Timer,
            bound: None,
            running: false,
            remaining_secs: u64::from(focus_minutes) * 60,
            elapsed_secs: 0,
            focus_minutes,
            timer_ticks: 0,
            resync_pending: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> SessionState {
        match (&self.bound, self.running) {
            (None, _) => SessionState::Idle,
            (Some(_), false) => SessionState::Paused,
            (Some(_), true) => SessionState::Running,
        }
    }

    pub fn bound_task(&self) -> Option<&BoundTask> {
        self.bound.as_ref()
    }

    pub fn bound_task_id(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.id.as_str())
    }

    pub fn bound_task_title(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.title.as_str())
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Remaining seconds in timer mode, elapsed seconds in stopwatch mode.
    pub fn seconds(&self) -> u64 {
        match self.mode {
            TimerMode::Timer => self.remaining_secs,
            TimerMode::Stopwatch => self.elapsed_secs,
        }
    }

    pub fn focus_minutes(&self) -> u32 {
        self.focus_minutes
    }

    /// Full countdown length in seconds.
    pub fn total_secs(&self) -> u64 {
        u64::from(self.focus_minutes) * 60
    }

    /// Seconds actually spent focusing in the active mode.
    pub fn focused_secs(&self) -> u64 {
        match self.mode {
            TimerMode::Timer => self.timer_ticks,
            TimerMode::Stopwatch => self.elapsed_secs,
        }
    }

    /// 0.0 .. 1.0 progress for a ring indicator.
    ///
    /// The stopwatch has no end, so its ring shows progress through the
    /// current minute.
    pub fn progress(&self) -> f64 {
        match self.mode {
            TimerMode::Timer => {
                let total = self.total_secs();
                if total == 0 {
                    return 0.0;
                }
                1.0 - (self.remaining_secs as f64 / total as f64)
            }
            TimerMode::Stopwatch => (self.elapsed_secs % 60) as f64 / 60.0,
        }
    }

    /// Active counter as `MM:SS`. Minutes are not wrapped at 60.
    pub fn clock(&self) -> String {
        format_clock(self.seconds())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            mode: self.mode,
            running: self.running,
            task_id: self.bound.as_ref().map(|b| b.id.clone()),
            task_title: self.bound.as_ref().map(|b| b.title.clone()),
            seconds: self.seconds(),
            clock: self.clock(),
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Focus on a task.
    ///
    /// On the bound task this toggles running/paused without touching the
    /// counters. On any other task it rebinds, switches to timer mode and
    /// starts the countdown from full. The caller guarantees the task exists.
    pub fn start_focus(&mut self, task_id: &str, task_title: &str) -> Option<Event> {
        if self.bound_task_id() == Some(task_id) {
            return self.toggle_running();
        }

        self.bound = Some(BoundTask {
            id: task_id.to_string(),
            title: task_title.to_string(),
        });
        self.mode = TimerMode::Timer;
        self.restart_countdown();
        self.running = true;

        Some(Event::FocusStarted {
            task_id: task_id.to_string(),
            task_title: task_title.to_string(),
            duration_secs: self.total_secs(),
            at: Utc::now(),
        })
    }

    /// Unbind the task and return to idle with both counters at their defaults.
    pub fn stop_focus(&mut self) -> Option<Event> {
        let bound = self.bound.take()?;
        let seconds = self.focused_secs();
        let mode = self.mode;

        self.running = false;
        self.restart_countdown();
        self.elapsed_secs = 0;

        Some(Event::FocusStopped {
            task_id: bound.id,
            task_title: bound.title,
            mode,
            seconds,
            at: Utc::now(),
        })
    }

    /// Flip between running and paused. No effect while idle.
    pub fn toggle_running(&mut self) -> Option<Event> {
        self.bound.as_ref()?;
        if self.running {
            self.pause()
        } else {
            self.resume()
        }
    }

    /// Clear the active mode's counter. Binding and running flag are kept.
    /// No effect while idle.
    pub fn reset(&mut self) -> Option<Event> {
        self.bound.as_ref()?;
        match self.mode {
            TimerMode::Timer => self.restart_countdown(),
            TimerMode::Stopwatch => self.elapsed_secs = 0,
        }
        Some(Event::TimerReset {
            mode: self.mode,
            at: Utc::now(),
        })
    }

    /// Point the binding at a task's new id, as when the backend assigns one.
    /// Returns whether the bound task was `from`.
    pub fn rebind_id(&mut self, from: &str, to: &str) -> bool {
        match self.bound.as_mut().filter(|b| b.id == from) {
            Some(bound) => {
                bound.id = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Change mode. Stops ticking; the other mode's counter is left as is.
    pub fn switch_mode(&mut self, mode: TimerMode) -> Option<Event> {
        if mode == self.mode {
            return None;
        }
        let from = self.mode;
        self.running = false;
        self.mode = mode;
        self.apply_pending_resync();
        Some(Event::ModeSwitched {
            from,
            to: mode,
            at: Utc::now(),
        })
    }

    /// Propagate a new focus duration from settings.
    ///
    /// While paused or idle in timer mode the countdown jumps to the new full
    /// length. Otherwise the countdown is only clamped to the new length and
    /// the full resync happens at the next pause.
    pub fn set_focus_minutes(&mut self, minutes: u32) -> Result<Option<Event>, ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::InvalidDuration);
        }
        if minutes == self.focus_minutes {
            return Ok(None);
        }

        self.focus_minutes = minutes;
        if !self.running && self.mode == TimerMode::Timer {
            self.restart_countdown();
        } else {
            self.remaining_secs = self.remaining_secs.min(self.total_secs());
            self.resync_pending = true;
        }

        Ok(Some(Event::DurationChanged {
            minutes,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        }))
    }

    /// Advance the active counter by one second.
    ///
    /// Returns `Some(Event::FocusCompleted)` on the tick that brings the
    /// countdown to zero; the session then stops running but stays bound.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        match self.mode {
            TimerMode::Timer => {
                if self.remaining_secs > 0 {
                    self.remaining_secs -= 1;
                    self.timer_ticks += 1;
                }
                if self.remaining_secs == 0 {
                    self.running = false;
                    return Some(Event::FocusCompleted {
                        task_id: self.bound.as_ref().map(|b| b.id.clone()),
                        task_title: self.bound.as_ref().map(|b| b.title.clone()),
                        focused_secs: self.timer_ticks,
                        at: Utc::now(),
                    });
                }
                None
            }
            TimerMode::Stopwatch => {
                self.elapsed_secs = self.elapsed_secs.saturating_add(1);
                None
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn pause(&mut self) -> Option<Event> {
        self.running = false;
        self.apply_pending_resync();
        Some(Event::TimerPaused {
            mode: self.mode,
            seconds: self.seconds(),
            at: Utc::now(),
        })
    }

    fn resume(&mut self) -> Option<Event> {
        // A finished countdown has nothing left to run.
        if self.mode == TimerMode::Timer && self.remaining_secs == 0 {
            return None;
        }
        self.running = true;
        Some(Event::TimerResumed {
            mode: self.mode,
            seconds: self.seconds(),
            at: Utc::now(),
        })
    }

    fn restart_countdown(&mut self) {
        self.remaining_secs = self.total_secs();
        self.timer_ticks = 0;
        self.resync_pending = false;
    }

    fn apply_pending_resync(&mut self) {
        if self.resync_pending && !self.running && self.mode == TimerMode::Timer {
            self.restart_countdown();
        }
    }
}

/// Format seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SessionEngine {
        SessionEngine::new(25).unwrap()
    }

    fn tick_n(engine: &mut SessionEngine, n: usize) {
        for _ in 0..n {
            engine.tick();
        }
    }

    #[test]
    fn new_engine_is_idle_with_full_countdown() {
        let engine = engine();
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.mode(), TimerMode::Timer);
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.bound_task_id(), None);
    }

    #[test]
    fn zero_minutes_rejected() {
        assert_eq!(
            SessionEngine::new(0).unwrap_err(),
            ValidationError::InvalidDuration
        );
    }

    #[test]
    fn start_focus_binds_and_runs() {
        let mut engine = engine();
        let event = engine.start_focus("a", "Write report");
        assert!(matches!(event, Some(Event::FocusStarted { duration_secs: 1500, .. })));
        assert_eq!(engine.state(), SessionState::Running);
        assert_eq!(engine.bound_task_title(), Some("Write report"));
    }

    #[test]
    fn reference_scenario() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        assert_eq!(engine.remaining_secs(), 1500);

        tick_n(&mut engine, 3);
        assert_eq!(engine.remaining_secs(), 1497);

        engine.start_focus("a", "A");
        assert_eq!(engine.state(), SessionState::Paused);
        assert_eq!(engine.remaining_secs(), 1497);

        engine.start_focus("b", "B");
        assert_eq!(engine.state(), SessionState::Running);
        assert_eq!(engine.bound_task_id(), Some("b"));
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn rebinding_while_running_restarts_countdown() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 10);
        engine.start_focus("b", "B");
        assert!(engine.is_running());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn start_focus_switches_back_to_timer_mode() {
        let mut engine = engine();
        engine.switch_mode(TimerMode::Stopwatch);
        engine.start_focus("a", "A");
        assert_eq!(engine.mode(), TimerMode::Timer);
    }

    #[test]
    fn toggle_is_noop_when_idle() {
        let mut engine = engine();
        assert!(engine.toggle_running().is_none());
        assert_eq!(engine.state(), SessionState::Idle);
    }

    #[test]
    fn stop_focus_returns_to_idle() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 42);
        engine.switch_mode(TimerMode::Stopwatch);
        engine.toggle_running();
        tick_n(&mut engine, 7);

        let event = engine.stop_focus();
        assert!(matches!(
            event,
            Some(Event::FocusStopped { seconds: 7, mode: TimerMode::Stopwatch, .. })
        ));
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.elapsed_secs(), 0);
        assert!(engine.stop_focus().is_none());
    }

    #[test]
    fn reset_keeps_binding_and_running_flag() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 30);
        engine.reset();
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.state(), SessionState::Running);

        engine.toggle_running();
        tick_n(&mut engine, 5);
        engine.reset();
        assert_eq!(engine.state(), SessionState::Paused);
        assert_eq!(engine.bound_task_id(), Some("a"));
    }

    #[test]
    fn reset_while_idle_is_a_no_op() {
        let mut engine = engine();
        assert!(engine.reset().is_none());
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.remaining_secs(), 1500);

        engine.start_focus("a", "A");
        assert!(matches!(engine.reset(), Some(Event::TimerReset { .. })));
    }

    #[test]
    fn rebind_id_follows_server_id() {
        let mut engine = engine();
        assert!(!engine.rebind_id("tmp", "7"));
        engine.start_focus("tmp", "A");
        assert!(!engine.rebind_id("other", "8"));
        assert!(engine.rebind_id("tmp", "7"));
        assert_eq!(engine.bound_task_id(), Some("7"));
        assert_eq!(engine.bound_task_title(), Some("A"));
    }

    #[test]
    fn reset_in_stopwatch_clears_only_elapsed() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 10);
        engine.switch_mode(TimerMode::Stopwatch);
        engine.toggle_running();
        tick_n(&mut engine, 20);
        engine.reset();
        assert_eq!(engine.elapsed_secs(), 0);
        assert_eq!(engine.remaining_secs(), 1490);
    }

    #[test]
    fn countdown_completes_and_holds_at_zero() {
        let mut engine = SessionEngine::new(1).unwrap();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 59);
        assert!(engine.is_running());

        let event = engine.tick();
        assert!(matches!(
            event,
            Some(Event::FocusCompleted { focused_secs: 60, .. })
        ));
        assert!(!engine.is_running());
        assert_eq!(engine.state(), SessionState::Paused);
        assert_eq!(engine.remaining_secs(), 0);

        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn finished_countdown_does_not_resume() {
        let mut engine = SessionEngine::new(1).unwrap();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 60);
        assert!(engine.toggle_running().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn stopwatch_counts_up() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        engine.switch_mode(TimerMode::Stopwatch);
        assert!(!engine.is_running());
        engine.toggle_running();
        tick_n(&mut engine, 125);
        assert_eq!(engine.elapsed_secs(), 125);
        assert_eq!(engine.clock(), "02:05");
    }

    #[test]
    fn mode_switch_keeps_other_counter() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 100);
        engine.switch_mode(TimerMode::Stopwatch);
        engine.toggle_running();
        tick_n(&mut engine, 15);
        engine.switch_mode(TimerMode::Timer);
        assert_eq!(engine.remaining_secs(), 1400);
        engine.switch_mode(TimerMode::Stopwatch);
        assert_eq!(engine.elapsed_secs(), 15);
    }

    #[test]
    fn switching_to_same_mode_is_noop() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        assert!(engine.switch_mode(TimerMode::Timer).is_none());
        assert!(engine.is_running());
    }

    #[test]
    fn duration_change_while_paused_applies_immediately() {
        let mut engine = engine();
        engine.set_focus_minutes(50).unwrap();
        assert_eq!(engine.remaining_secs(), 3000);

        engine.start_focus("a", "A");
        tick_n(&mut engine, 10);
        engine.toggle_running();
        engine.set_focus_minutes(30).unwrap();
        assert_eq!(engine.remaining_secs(), 1800);
    }

    #[test]
    fn duration_change_while_running_waits_for_pause() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        tick_n(&mut engine, 10);
        engine.set_focus_minutes(50).unwrap();
        assert_eq!(engine.remaining_secs(), 1490);

        tick_n(&mut engine, 1);
        assert_eq!(engine.remaining_secs(), 1489);

        engine.toggle_running();
        assert_eq!(engine.remaining_secs(), 3000);
    }

    #[test]
    fn shorter_duration_while_running_clamps_countdown() {
        let mut engine = engine();
        engine.start_focus("a", "A");
        engine.set_focus_minutes(10).unwrap();
        assert_eq!(engine.remaining_secs(), 600);
        assert!(engine.is_running());
    }

    #[test]
    fn unchanged_or_zero_duration() {
        let mut engine = engine();
        assert_eq!(engine.set_focus_minutes(25), Ok(None));
        assert_eq!(
            engine.set_focus_minutes(0),
            Err(ValidationError::InvalidDuration)
        );
    }

    #[test]
    fn progress_in_both_modes() {
        let mut engine = SessionEngine::new(1).unwrap();
        assert_eq!(engine.progress(), 0.0);
        engine.start_focus("a", "A");
        tick_n(&mut engine, 15);
        assert!((engine.progress() - 0.25).abs() < f64::EPSILON);

        engine.switch_mode(TimerMode::Stopwatch);
        engine.toggle_running();
        tick_n(&mut engine, 90);
        assert!((engine.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn format_clock_pads_and_does_not_wrap_minutes() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(3725), "62:05");
    }
}
