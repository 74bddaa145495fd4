mod driver;
mod engine;

pub use driver::{FocusTimer, TICK_INTERVAL};
pub use engine::{format_clock, BoundTask, SessionEngine, SessionState, TimerMode};
