//! # Focus Hub Core Library
//!
//! Core logic for Focus Hub, a personal productivity client: a task list, a
//! pomodoro-style focus timer, a day planner, focus history and analytics,
//! persisted best-effort through a hosted PostgREST backend. The `focushub`
//! CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure state machine advanced by `tick()`, plus a
//!   Tokio driver that owns the single one-second tick task
//! - **Gateway**: typed table access that degrades to offline no-ops when no
//!   backend is configured or a call fails
//! - **Controllers**: task list, planner and history apply changes locally
//!   first and persist fire-and-forget
//! - **Shell**: the application state container tying it all together
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: focus session state machine
//! - [`FocusTimer`]: ticking driver with an event broadcast
//! - [`Gateway`]: backend access
//! - [`TaskList`]: in-memory task collection
//! - [`App`]: top-level state
//! - [`Config`]: local configuration

pub mod analytics;
pub mod error;
pub mod events;
pub mod gateway;
pub mod history;
pub mod plan;
pub mod settings;
pub mod shell;
pub mod storage;
pub mod sync;
pub mod task;
pub mod timer;

pub use analytics::{AnalyticsReport, FocusSummary};
pub use error::{BackendError, ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use gateway::{BackendClient, Gateway, Record};
pub use history::{FocusHistory, LogEntry};
pub use plan::{PlanKind, PlannedTask, Planner};
pub use settings::{Language, Settings, SettingsPatch};
pub use shell::{App, Modal, View};
pub use storage::Config;
pub use task::{Category, Priority, Task, TaskFilter, TaskList};
pub use timer::{FocusTimer, SessionEngine, SessionState, TimerMode};
