//! Day planner: time-slotted entries shown beside the task list.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::gateway::{de_id, Gateway, Record};
use crate::sync::{IdMap, IdRemap, PendingSyncs};
use crate::task::Task;

/// Slot time used when a task is planned from the task list.
pub const DEFAULT_SLOT_TIME: &str = "12:00";
/// Duration label used when a task is planned from the task list.
pub const DEFAULT_SLOT_DURATION: &str = "30m";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    #[default]
    Default,
    Focus,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::Default => write!(f, "default"),
            PlanKind::Focus => write!(f, "focus"),
        }
    }
}

impl FromStr for PlanKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(PlanKind::Default),
            "focus" => Ok(PlanKind::Focus),
            other => Err(ValidationError::InvalidValue {
                field: "type".into(),
                message: format!("unknown plan type '{other}'"),
            }),
        }
    }
}

/// A planned slot in the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTask {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// Start time, `HH:MM`.
    pub time: String,
    pub title: String,
    /// Display label such as "30m" or "2h 00m".
    pub duration: String,
    #[serde(rename = "type", default)]
    pub kind: PlanKind,
}

impl Record for PlannedTask {
    const TABLE: &'static str = "planned_tasks";
    const ORDER: &'static str = "time.asc";

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// Insert payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlannedTask {
    pub time: String,
    pub title: String,
    pub duration: String,
    #[serde(rename = "type")]
    pub kind: PlanKind,
}

/// Parse `H:MM`/`HH:MM` and normalize to zero-padded `HH:MM`.
pub fn normalize_time(time: &str) -> Result<String, ValidationError> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ValidationError::InvalidTime(time.to_string()))
}

#[derive(Debug)]
pub struct Planner {
    entries: Vec<PlannedTask>,
    gateway: Gateway,
    pending: PendingSyncs,
}

impl Planner {
    pub fn new(gateway: Gateway) -> Self {
        Self::with_entries(gateway, Vec::new())
    }

    pub fn with_entries(gateway: Gateway, mut entries: Vec<PlannedTask>) -> Self {
        entries.sort_by(|a, b| a.time.cmp(&b.time));
        Self {
            entries,
            gateway,
            pending: PendingSyncs::new(),
        }
    }

    pub async fn load(gateway: Gateway) -> Self {
        let entries = gateway.planned_tasks().get_all().await;
        Self::with_entries(gateway, entries)
    }

    /// Entries ordered by start time.
    pub fn entries(&self) -> &[PlannedTask] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plan a focus slot for a task at the default time.
    pub fn add_from_task(&mut self, task: &Task) -> &PlannedTask {
        let row = NewPlannedTask {
            time: DEFAULT_SLOT_TIME.into(),
            title: task.title.clone(),
            duration: DEFAULT_SLOT_DURATION.into(),
            kind: PlanKind::Focus,
        };
        self.insert(row)
    }

    pub fn add(
        &mut self,
        time: &str,
        title: &str,
        duration: &str,
        kind: PlanKind,
    ) -> Result<&PlannedTask, ValidationError> {
        let time = normalize_time(time)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let row = NewPlannedTask {
            time,
            title: title.to_string(),
            duration: duration.trim().to_string(),
            kind,
        };
        Ok(self.insert(row))
    }

    pub fn remove(&mut self, id: &str) -> Result<PlannedTask, ValidationError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))?;
        let removed = self.entries.remove(idx);

        let id = id.to_string();
        self.sync(move |gateway, ids| async move {
            if let Some(id) = ids.resolve(&id) {
                gateway.planned_tasks().delete(&id).await;
            }
            None
        });
        Ok(removed)
    }

    /// Await in-flight backend calls and adopt server ids.
    pub async fn flush(&mut self) -> usize {
        let mut applied = 0;
        for remap in self.pending.drain().await {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == remap.local) {
                entry.id = remap.server;
                applied += 1;
            }
        }
        applied
    }

    fn insert(&mut self, row: NewPlannedTask) -> &PlannedTask {
        let entry = PlannedTask {
            id: Uuid::new_v4().to_string(),
            time: row.time.clone(),
            title: row.title.clone(),
            duration: row.duration.clone(),
            kind: row.kind,
        };
        let local = entry.id.clone();
        // after any entries with the same time
        let idx = self.entries.partition_point(|e| e.time <= entry.time);
        self.entries.insert(idx, entry);

        self.sync(move |gateway, ids| async move {
            let created = gateway.planned_tasks().create(&row).await;
            ids.settle(&local, created.as_ref().map(|e| e.id.as_str()));
            Some(IdRemap {
                local,
                server: created?.id,
            })
        });
        &self.entries[idx]
    }

    fn sync<F, Fut>(&mut self, call: F)
    where
        F: FnOnce(Gateway, IdMap) -> Fut,
        Fut: Future<Output = Option<IdRemap>> + Send + 'static,
    {
        if self.gateway.is_available() {
            let call = call(self.gateway.clone(), self.pending.ids());
            self.pending.spawn(call);
        }
    }
}

/// Starter plan shown when the backend has none.
pub fn sample_plan() -> Vec<PlannedTask> {
    let entry = |id: &str, time: &str, title: &str, duration: &str, kind| PlannedTask {
        id: id.into(),
        time: time.into(),
        title: title.into(),
        duration: duration.into(),
        kind,
    };
    vec![
        entry("p1", "09:00", "Daily Standup", "30m", PlanKind::Default),
        entry("p2", "09:30", "Deep Work Block", "2h 00m", PlanKind::Focus),
        entry("p3", "11:30", "Design Review", "1h", PlanKind::Default),
    ]
}
