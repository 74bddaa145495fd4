//! Focus history: one append-only entry per finished or abandoned session.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::parse_duration_minutes;
use crate::events::Event;
use crate::gateway::{de_opt_id, Gateway, Record};
use crate::sync::PendingSyncs;
use crate::timer::TimerMode;

/// Most recent entries fetched from the backend.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Local wall-clock time the session ended, `HH:MM`.
    pub time: String,
    /// Display label such as "+25m".
    pub duration: String,
    pub title: String,
    /// Share of the planned session actually focused, 0..=100.
    pub percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for LogEntry {
    const TABLE: &'static str = "focus_logs";
    const ORDER: &'static str = "created_at.desc";
    const LIMIT: Option<usize> = Some(HISTORY_LIMIT);

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl LogEntry {
    /// Build an entry for a session that ended at `at`.
    ///
    /// A session with no planned length (stopwatch) counts as complete.
    pub fn from_session(title: &str, focused_secs: u64, planned_secs: u64, at: DateTime<Utc>) -> Self {
        let percentage = if planned_secs == 0 {
            100
        } else {
            (focused_secs.saturating_mul(100) / planned_secs).min(100) as u8
        };
        Self {
            id: None,
            time: at.with_timezone(&Local).format("%H:%M").to_string(),
            duration: format!("+{}m", focused_secs / 60),
            title: title.to_string(),
            percentage,
            created_at: Some(at),
        }
    }

    /// Build an entry from a timer event that ends a session.
    ///
    /// `planned_secs` is the configured focus length. Stopwatch sessions have
    /// no planned length and always count as complete.
    pub fn from_event(event: &Event, planned_secs: u64) -> Option<Self> {
        match event {
            Event::FocusCompleted {
                task_title: Some(title),
                focused_secs,
                at,
                ..
            } => Some(Self::from_session(title, *focused_secs, planned_secs, *at)),
            Event::FocusStopped {
                task_title,
                mode,
                seconds,
                at,
                ..
            } => {
                let planned = match mode {
                    TimerMode::Timer => planned_secs,
                    TimerMode::Stopwatch => 0,
                };
                Some(Self::from_session(task_title, *seconds, planned, *at))
            }
            _ => None,
        }
    }

    pub fn minutes(&self) -> u32 {
        parse_duration_minutes(&self.duration).unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct FocusHistory {
    entries: Vec<LogEntry>,
    gateway: Gateway,
    pending: PendingSyncs,
}

impl FocusHistory {
    pub fn new(gateway: Gateway) -> Self {
        Self::with_entries(gateway, Vec::new())
    }

    pub fn with_entries(gateway: Gateway, entries: Vec<LogEntry>) -> Self {
        Self {
            entries,
            gateway,
            pending: PendingSyncs::new(),
        }
    }

    pub async fn load(gateway: Gateway) -> Self {
        let entries = gateway.focus_logs().get_all().await;
        Self::with_entries(gateway, entries)
    }

    /// Newest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepend an entry and persist it.
    pub fn record(&mut self, entry: LogEntry) -> &LogEntry {
        tracing::info!(title = %entry.title, duration = %entry.duration, percentage = entry.percentage, "focus session logged");
        self.entries.insert(0, entry.clone());
        self.entries.truncate(HISTORY_LIMIT);

        if self.gateway.is_available() {
            let gateway = self.gateway.clone();
            self.pending.spawn(async move {
                gateway.focus_logs().create(&entry).await;
                None
            });
        }
        &self.entries[0]
    }

    /// Sum of focused minutes across listed entries.
    pub fn total_focus_minutes(&self) -> u32 {
        self.entries.iter().map(LogEntry::minutes).sum()
    }

    pub async fn flush(&mut self) {
        self.pending.drain().await;
    }
}

/// Starter history shown when the backend has none.
pub fn sample_logs() -> Vec<LogEntry> {
    let entry = |time: &str, duration: &str, title: &str, percentage| LogEntry {
        id: None,
        time: time.into(),
        duration: duration.into(),
        title: title.into(),
        percentage,
        created_at: None,
    };
    vec![
        entry("08:45", "+15m", "Email Triage", 30),
        entry("09:15", "+25m", "Wireframing", 100),
        entry("09:45", "+25m", "Wireframing", 100),
    ]
}
