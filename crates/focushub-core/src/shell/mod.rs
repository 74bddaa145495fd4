//! Application state container.
//!
//! [`App`] owns every piece of top-level state (current view, modal flags,
//! task list, planner, history, settings and the focus timer) and is passed
//! by reference to whatever drives it. There is no global instance.

mod brain_dump;
mod nudge;

pub use brain_dump::{sample_notes, BrainDump};
pub use nudge::NudgeTrigger;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::broadcast;

use crate::analytics::AnalyticsReport;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::gateway::Gateway;
use crate::history::{sample_logs, FocusHistory, LogEntry};
use crate::plan::{sample_plan, PlanKind, PlannedTask, Planner};
use crate::settings::{Language, Settings, SettingsPatch};
use crate::storage::{Config, ShellConfig};
use crate::sync::PendingSyncs;
use crate::task::{sample_tasks, Category, EditSession, Priority, Task, TaskFilter, TaskList};
use crate::timer::{FocusTimer, TimerMode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Dashboard,
    Analytics,
    Settings,
}

impl FromStr for View {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(View::Dashboard),
            "analytics" => Ok(View::Analytics),
            "settings" => Ok(View::Settings),
            other => Err(ValidationError::InvalidValue {
                field: "view".into(),
                message: format!("unknown view '{other}'"),
            }),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Dashboard => write!(f, "dashboard"),
            View::Analytics => write!(f, "analytics"),
            View::Settings => write!(f, "settings"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    BrainDump,
    /// Streak-relaxing nudge, raised by the delayed trigger.
    ElasticMode,
    Classification,
}

#[derive(Debug, Default)]
struct Modals {
    brain_dump: bool,
    classification: bool,
    elastic: Arc<AtomicBool>,
}

impl Modals {
    fn set(&mut self, modal: Modal, open: bool) {
        match modal {
            Modal::BrainDump => self.brain_dump = open,
            Modal::Classification => self.classification = open,
            Modal::ElasticMode => self.elastic.store(open, Ordering::SeqCst),
        }
    }

    fn is_open(&self, modal: Modal) -> bool {
        match modal {
            Modal::BrainDump => self.brain_dump,
            Modal::Classification => self.classification,
            Modal::ElasticMode => self.elastic.load(Ordering::SeqCst),
        }
    }
}

pub struct App {
    gateway: Gateway,
    view: View,
    modals: Modals,
    nudge: Option<NudgeTrigger>,
    tasks: TaskList,
    planner: Planner,
    history: FocusHistory,
    brain_dump: BrainDump,
    settings: Settings,
    settings_sync: PendingSyncs,
    timer: FocusTimer,
}

impl App {
    /// Connect per `config` and load everything.
    pub async fn load(config: &Config) -> Result<Self> {
        Self::load_with(Gateway::from_config(config), &config.shell).await
    }

    /// Load tasks, plan, history and settings concurrently, seed empty
    /// collections when enabled, and arm the nudge.
    pub async fn load_with(gateway: Gateway, shell: &ShellConfig) -> Result<Self> {
        let settings_store = gateway.settings();
        let (mut tasks, mut planner, mut history, settings) = tokio::join!(
            TaskList::load(gateway.clone()),
            Planner::load(gateway.clone()),
            FocusHistory::load(gateway.clone()),
            settings_store.get(),
        );

        let mut brain_dump = BrainDump::new();
        if shell.seed_samples {
            if tasks.is_empty() {
                tasks = TaskList::with_tasks(gateway.clone(), sample_tasks());
            }
            if planner.is_empty() {
                planner = Planner::with_entries(gateway.clone(), sample_plan());
            }
            if history.is_empty() {
                history = FocusHistory::with_entries(gateway.clone(), sample_logs());
            }
            brain_dump = BrainDump::with_notes(sample_notes());
        }

        let mut settings = settings.unwrap_or_default();
        if settings.focus_duration == 0 {
            tracing::warn!("stored focus duration is zero, using default");
            settings.focus_duration = Settings::default().focus_duration;
        }

        let timer = FocusTimer::new(settings.focus_duration)?;
        let modals = Modals::default();
        let nudge = match shell.nudge_delay_secs {
            0 => None,
            secs => Some(NudgeTrigger::arm(
                Duration::from_secs(secs),
                Arc::clone(&modals.elastic),
            )?),
        };

        tracing::debug!(
            online = gateway.is_available(),
            tasks = tasks.len(),
            language = %settings.language,
            focus_minutes = settings.focus_duration,
            "app loaded"
        );

        Ok(Self {
            gateway,
            view: View::default(),
            modals,
            nudge,
            tasks,
            planner,
            history,
            brain_dump,
            settings,
            settings_sync: PendingSyncs::new(),
            timer,
        })
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    // ── Views and modals ─────────────────────────────────────────────

    pub fn view(&self) -> View {
        self.view
    }

    pub fn navigate(&mut self, view: View) {
        self.view = view;
    }

    pub fn open_modal(&mut self, modal: Modal) {
        self.modals.set(modal, true);
    }

    pub fn close_modal(&mut self, modal: Modal) {
        self.modals.set(modal, false);
    }

    pub fn is_modal_open(&self, modal: Modal) -> bool {
        self.modals.is_open(modal)
    }

    /// Cancel the pending nudge, as when the shell is torn down early.
    pub fn cancel_nudge(&mut self) {
        if let Some(nudge) = self.nudge.take() {
            nudge.cancel();
        }
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn filtered_tasks(&self, filter: TaskFilter) -> Vec<&Task> {
        self.tasks.filter(filter)
    }

    pub fn add_task(&mut self, title: &str) -> std::result::Result<&Task, ValidationError> {
        self.tasks.add(title)
    }

    pub fn add_task_with(
        &mut self,
        title: &str,
        priority: Priority,
        category: Category,
    ) -> std::result::Result<&Task, ValidationError> {
        self.tasks.add_with(title, priority, category)
    }

    pub fn rename_task(&mut self, id: &str, title: &str) -> std::result::Result<(), ValidationError> {
        self.tasks.rename(id, title)
    }

    pub fn toggle_task(&mut self, id: &str) -> std::result::Result<bool, ValidationError> {
        self.tasks.toggle(id)
    }

    pub fn set_task_priority(&mut self, id: &str, priority: Priority) -> std::result::Result<(), ValidationError> {
        self.tasks.set_priority(id, priority)
    }

    pub fn set_task_category(&mut self, id: &str, category: Category) -> std::result::Result<(), ValidationError> {
        self.tasks.set_category(id, category)
    }

    /// Remove a task. Removing the task bound to the timer stops the session.
    pub fn remove_task(&mut self, id: &str) -> std::result::Result<Task, ValidationError> {
        let removed = self.tasks.remove(id)?;
        if self.timer.bound_task_id().as_deref() == Some(id) {
            tracing::info!(task_id = %id, "bound task removed, stopping focus");
            self.timer.stop_focus();
        }
        Ok(removed)
    }

    pub fn begin_edit(&mut self, id: &str) -> std::result::Result<&EditSession, ValidationError> {
        self.tasks.begin_edit(id)
    }

    pub fn commit_edit(&mut self, text: &str) -> std::result::Result<bool, ValidationError> {
        self.tasks.commit_edit(text)
    }

    pub fn cancel_edit(&mut self) {
        self.tasks.cancel_edit();
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.timer.subscribe()
    }

    /// Focus on a task from the list, or pause/resume it if already bound.
    pub fn start_focus(&mut self, task_id: &str) -> std::result::Result<Option<Event>, ValidationError> {
        let title = self
            .tasks
            .get(task_id)
            .map(|t| t.title.clone())
            .ok_or_else(|| ValidationError::UnknownTask(task_id.to_string()))?;
        Ok(self.timer.start_focus(task_id, &title))
    }

    pub fn stop_focus(&mut self) -> Option<Event> {
        self.timer.stop_focus()
    }

    pub fn toggle_timer(&mut self) -> Option<Event> {
        self.timer.toggle_running()
    }

    pub fn reset_timer(&mut self) -> Option<Event> {
        self.timer.reset()
    }

    pub fn switch_mode(&mut self, mode: TimerMode) -> Option<Event> {
        self.timer.switch_mode(mode)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn language(&self) -> Language {
        self.settings.language
    }

    pub fn set_language(&mut self, language: Language) {
        if let Err(e) = self.update_settings(SettingsPatch::language(language)) {
            tracing::warn!(error = %e, "language change rejected");
        }
    }

    pub fn set_focus_duration(&mut self, minutes: u32) -> std::result::Result<(), ValidationError> {
        self.update_settings(SettingsPatch::focus_duration(minutes))
    }

    /// Apply locally, propagate the focus duration to the timer, and upsert
    /// in the background.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> std::result::Result<(), ValidationError> {
        patch.validate()?;
        if patch.is_empty() {
            return Ok(());
        }

        self.settings.apply(&patch);
        if let Some(minutes) = patch.focus_duration {
            self.timer.set_focus_minutes(minutes)?;
        }

        if self.gateway.is_available() {
            let gateway = self.gateway.clone();
            self.settings_sync.spawn(async move {
                if gateway.settings().upsert(&patch).await.is_none() {
                    tracing::warn!("settings changed locally but were not saved");
                }
                None
            });
        }
        Ok(())
    }

    // ── Planner and history ──────────────────────────────────────────

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn add_to_plan(&mut self, task_id: &str) -> std::result::Result<&PlannedTask, ValidationError> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| ValidationError::UnknownTask(task_id.to_string()))?;
        Ok(self.planner.add_from_task(task))
    }

    pub fn plan(
        &mut self,
        time: &str,
        title: &str,
        duration: &str,
        kind: PlanKind,
    ) -> std::result::Result<&PlannedTask, ValidationError> {
        self.planner.add(time, title, duration, kind)
    }

    pub fn unplan(&mut self, id: &str) -> std::result::Result<PlannedTask, ValidationError> {
        self.planner.remove(id)
    }

    pub fn history(&self) -> &FocusHistory {
        &self.history
    }

    /// Record a history entry for a session-ending event.
    ///
    /// Sessions are only logged when the caller asks for it.
    pub fn log_session(&mut self, event: &Event) -> Option<&LogEntry> {
        let planned = u64::from(self.settings.focus_duration) * 60;
        let entry = LogEntry::from_event(event, planned)?;
        Some(self.history.record(entry))
    }

    pub fn record_log(&mut self, entry: LogEntry) -> &LogEntry {
        self.history.record(entry)
    }

    pub fn analytics(&self, today: NaiveDate) -> AnalyticsReport {
        AnalyticsReport::build(self.history.entries(), self.tasks.tasks(), today)
    }

    // ── Brain dump ───────────────────────────────────────────────────

    pub fn brain_dump(&self) -> &BrainDump {
        &self.brain_dump
    }

    pub fn add_note(&mut self, text: &str) -> bool {
        self.brain_dump.add_note(text)
    }

    pub fn remove_note(&mut self, idx: usize) -> Option<String> {
        self.brain_dump.remove_note(idx)
    }

    /// Turn one note into a task and drop it from the inbox.
    pub fn convert_note(&mut self, idx: usize) -> std::result::Result<&Task, ValidationError> {
        let note = self
            .brain_dump
            .get(idx)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "note".into(),
                message: format!("no note at index {idx}"),
            })?;
        self.brain_dump.remove_note(idx);
        self.tasks.add(&note)
    }

    /// Turn every note into a task, empty the inbox and close the modal.
    /// Returns the number of tasks created.
    pub fn process_all_notes(&mut self) -> usize {
        let mut created = 0;
        // Oldest first so the newest note ends up on top of the task list.
        for note in self.brain_dump.take_all().iter().rev() {
            if self.tasks.add(note).is_ok() {
                created += 1;
            }
        }
        self.close_modal(Modal::BrainDump);
        created
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Wait for every in-flight backend call and reconcile server ids.
    pub async fn flush(&mut self) {
        let (remaps, plans, (), _) = tokio::join!(
            self.tasks.flush(),
            self.planner.flush(),
            self.history.flush(),
            self.settings_sync.drain(),
        );
        for remap in &remaps {
            if self.timer.rebind_id(&remap.local, &remap.server) {
                tracing::debug!(task_id = %remap.server, "focus binding follows server id");
            }
        }
        tracing::debug!(tasks = remaps.len(), plans, "pending backend calls flushed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionState;

    fn shell(seed: bool) -> ShellConfig {
        ShellConfig {
            nudge_delay_secs: 0,
            seed_samples: seed,
        }
    }

    async fn app() -> App {
        App::load_with(Gateway::offline(), &shell(true)).await.unwrap()
    }

    #[tokio::test]
    async fn offline_load_seeds_samples() {
        let app = app().await;
        assert_eq!(app.tasks().len(), 3);
        assert_eq!(app.planner().entries().len(), 3);
        assert_eq!(app.history().entries().len(), 3);
        assert_eq!(app.brain_dump().len(), 3);
        assert_eq!(app.settings(), &Settings::default());
        assert_eq!(app.view(), View::Dashboard);
        assert_eq!(app.timer().seconds(), 1500);
    }

    #[tokio::test]
    async fn offline_load_without_seeding() {
        let app = App::load_with(Gateway::offline(), &shell(false)).await.unwrap();
        assert!(app.tasks().is_empty());
        assert!(app.planner().is_empty());
        assert!(app.brain_dump().is_empty());
    }

    #[tokio::test]
    async fn navigate_and_modals() {
        let mut app = app().await;
        app.navigate(View::Analytics);
        assert_eq!(app.view(), View::Analytics);

        app.open_modal(Modal::BrainDump);
        assert!(app.is_modal_open(Modal::BrainDump));
        assert!(!app.is_modal_open(Modal::Classification));
        app.close_modal(Modal::BrainDump);
        assert!(!app.is_modal_open(Modal::BrainDump));
    }

    #[tokio::test(start_paused = true)]
    async fn nudge_opens_elastic_modal() {
        let shell = ShellConfig {
            nudge_delay_secs: 30,
            seed_samples: false,
        };
        let mut app = App::load_with(Gateway::offline(), &shell).await.unwrap();
        assert!(!app.is_modal_open(Modal::ElasticMode));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(app.is_modal_open(Modal::ElasticMode));
        app.close_modal(Modal::ElasticMode);
        assert!(!app.is_modal_open(Modal::ElasticMode));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_nudge_never_fires() {
        let shell = ShellConfig {
            nudge_delay_secs: 30,
            seed_samples: false,
        };
        let mut app = App::load_with(Gateway::offline(), &shell).await.unwrap();
        app.cancel_nudge();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!app.is_modal_open(Modal::ElasticMode));
    }

    #[tokio::test]
    async fn start_focus_requires_known_task() {
        let mut app = app().await;
        assert_eq!(
            app.start_focus("nope").unwrap_err(),
            ValidationError::UnknownTask("nope".into())
        );
        let event = app.start_focus("1").unwrap().unwrap();
        assert_eq!(event.kind(), "focus_started");
        assert_eq!(app.timer().state(), SessionState::Running);
        app.stop_focus();
    }

    #[tokio::test]
    async fn removing_bound_task_stops_focus() {
        let mut app = app().await;
        app.start_focus("2").unwrap();
        app.remove_task("2").unwrap();
        assert_eq!(app.timer().state(), SessionState::Idle);
        assert!(app.timer().bound_task_id().is_none());
    }

    #[tokio::test]
    async fn removing_other_task_keeps_focus() {
        let mut app = app().await;
        app.start_focus("1").unwrap();
        app.remove_task("3").unwrap();
        assert_eq!(app.timer().bound_task_id().as_deref(), Some("1"));
        app.stop_focus();
    }

    #[tokio::test]
    async fn focus_duration_reaches_timer() {
        let mut app = app().await;
        app.set_focus_duration(50).unwrap();
        assert_eq!(app.settings().focus_duration, 50);
        assert_eq!(app.timer().seconds(), 3000);
        assert_eq!(app.set_focus_duration(0), Err(ValidationError::InvalidDuration));
        assert_eq!(app.settings().focus_duration, 50);
    }

    #[tokio::test]
    async fn language_switch() {
        let mut app = app().await;
        app.set_language(Language::Zh);
        assert_eq!(app.language(), Language::Zh);
    }

    #[tokio::test]
    async fn convert_and_process_notes() {
        let mut app = app().await;
        app.open_modal(Modal::BrainDump);

        let title = app.convert_note(2).unwrap().title.clone();
        assert_eq!(title, "Cancel the gym subscription");
        assert_eq!(app.brain_dump().len(), 2);
        assert_eq!(app.tasks().tasks()[0].title, title);
        assert!(app.convert_note(5).is_err());

        assert_eq!(app.process_all_notes(), 2);
        assert!(app.brain_dump().is_empty());
        assert!(!app.is_modal_open(Modal::BrainDump));
        assert_eq!(app.tasks().len(), 6);
        assert_eq!(
            app.tasks().tasks()[0].title,
            "Need to research standing desks before the sale ends on Friday"
        );
    }

    #[tokio::test]
    async fn plan_from_task_and_log_session() {
        let mut app = app().await;
        let planned = app.add_to_plan("3").unwrap().clone();
        assert_eq!(planned.title, "Walk the dog");
        assert!(app.add_to_plan("x").is_err());

        app.start_focus("1").unwrap();
        let stopped = app.stop_focus().unwrap();
        let entry = app.log_session(&stopped).unwrap().clone();
        assert_eq!(entry.title, "Finalize Q3 Design System");
        assert_eq!(app.history().entries()[0], entry);

        app.flush().await;
    }
}
