//! Tokio driver for the session engine.
//!
//! [`FocusTimer`] wraps a [`SessionEngine`] and runs the one-second tick as a
//! background task. At most one tick task exists per timer: every command that
//! starts ticking aborts the previous task first, and each task carries a
//! generation number so a task that was already past its `await` when it got
//! aborted cannot apply a stale tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::engine::{SessionEngine, SessionState, TimerMode};
use crate::error::{Result, ValidationError};
use crate::events::Event;

/// Period of the session tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

const EVENT_CAPACITY: usize = 64;

struct Shared {
    engine: SessionEngine,
    generation: u64,
}

/// Focus timer: session engine plus the task that ticks it.
pub struct FocusTimer {
    shared: Arc<Mutex<Shared>>,
    ticker: Option<JoinHandle<()>>,
    events: broadcast::Sender<Event>,
    runtime: Handle,
}

impl FocusTimer {
    /// Create an idle timer. Must be called from within a Tokio runtime.
    pub fn new(focus_minutes: u32) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let engine = SessionEngine::new(focus_minutes)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            shared: Arc::new(Mutex::new(Shared {
                engine,
                generation: 0,
            })),
            ticker: None,
            events,
            runtime,
        })
    }

    /// Receive every event the timer emits, including tick completions.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Copy of the engine state at this instant.
    pub fn engine(&self) -> SessionEngine {
        self.lock().engine.clone()
    }

    pub fn mode(&self) -> TimerMode {
        self.lock().engine.mode()
    }

    pub fn is_running(&self) -> bool {
        self.lock().engine.is_running()
    }

    pub fn state(&self) -> SessionState {
        self.lock().engine.state()
    }

    /// Remaining seconds (timer) or elapsed seconds (stopwatch).
    pub fn seconds(&self) -> u64 {
        self.lock().engine.seconds()
    }

    pub fn bound_task_id(&self) -> Option<String> {
        self.lock().engine.bound_task_id().map(str::to_string)
    }

    pub fn snapshot(&self) -> Event {
        self.lock().engine.snapshot()
    }

    /// Whether a tick task is currently alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|h| !h.is_finished())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_focus(&mut self, task_id: &str, task_title: &str) -> Option<Event> {
        self.command(|engine| engine.start_focus(task_id, task_title))
    }

    pub fn stop_focus(&mut self) -> Option<Event> {
        self.command(SessionEngine::stop_focus)
    }

    pub fn toggle_running(&mut self) -> Option<Event> {
        self.command(SessionEngine::toggle_running)
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.command(SessionEngine::reset)
    }

    pub fn switch_mode(&mut self, mode: TimerMode) -> Option<Event> {
        self.command(|engine| engine.switch_mode(mode))
    }

    /// Follow a bound task whose local id was replaced by a server id.
    pub fn rebind_id(&mut self, from: &str, to: &str) -> bool {
        self.lock().engine.rebind_id(from, to)
    }

    /// Propagate a focus duration change. Never restarts the tick.
    pub fn set_focus_minutes(&mut self, minutes: u32) -> Result<Option<Event>, ValidationError> {
        let event = self.lock().engine.set_focus_minutes(minutes)?;
        if let Some(event) = &event {
            self.publish(event);
        }
        Ok(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn command<F>(&mut self, f: F) -> Option<Event>
    where
        F: FnOnce(&mut SessionEngine) -> Option<Event>,
    {
        let (event, running) = {
            let mut guard = self.lock();
            let event = f(&mut guard.engine);
            (event, guard.engine.is_running())
        };
        let event = event?;

        let restarts_tick = matches!(
            event,
            Event::FocusStarted { .. } | Event::TimerResumed { .. } | Event::TimerReset { .. }
        );
        if !running {
            self.cancel_ticker();
        } else if restarts_tick {
            self.spawn_ticker();
        }

        tracing::debug!(event = event.kind(), running, "timer transition");
        self.publish(&event);
        Some(event)
    }

    fn publish(&self, event: &Event) {
        // No subscribers is fine.
        let _ = self.events.send(event.clone());
    }

    fn spawn_ticker(&mut self) {
        self.cancel_ticker();

        let generation = self.lock().generation;
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();

        let handle = self.runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;

                let (event, running) = {
                    let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if guard.generation != generation {
                        break;
                    }
                    let event = guard.engine.tick();
                    (event, guard.engine.is_running())
                };

                if let Some(event) = event {
                    if let Event::FocusCompleted { focused_secs, .. } = &event {
                        tracing::info!(focused_secs, "focus session completed");
                    }
                    let _ = events.send(event);
                }
                if !running {
                    break;
                }
            }
        });
        self.ticker = Some(handle);
    }

    fn cancel_ticker(&mut self) {
        self.lock().generation += 1;
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for FocusTimer {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
