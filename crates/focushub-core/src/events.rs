use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionState, TimerMode};

/// Every state change of the focus timer produces an Event.
/// The CLI prints them; completion listeners subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A task was bound and the countdown started from full.
    FocusStarted {
        task_id: String,
        task_title: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        seconds: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        mode: TimerMode,
        seconds: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. The task stays bound.
    FocusCompleted {
        task_id: Option<String>,
        task_title: Option<String>,
        focused_secs: u64,
        at: DateTime<Utc>,
    },
    /// Session ended by the user and the task unbound.
    FocusStopped {
        task_id: String,
        task_title: String,
        mode: TimerMode,
        seconds: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: TimerMode,
        to: TimerMode,
        at: DateTime<Utc>,
    },
    DurationChanged {
        minutes: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        mode: TimerMode,
        running: bool,
        task_id: Option<String>,
        task_title: Option<String>,
        seconds: u64,
        clock: String,
        progress: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Event name as used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::FocusStarted { .. } => "focus_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerResumed { .. } => "timer_resumed",
            Event::FocusCompleted { .. } => "focus_completed",
            Event::FocusStopped { .. } => "focus_stopped",
            Event::TimerReset { .. } => "timer_reset",
            Event::ModeSwitched { .. } => "mode_switched",
            Event::DurationChanged { .. } => "duration_changed",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
