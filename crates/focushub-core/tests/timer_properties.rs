//! Property tests for the session engine.

use focushub_core::timer::{SessionEngine, SessionState, TimerMode};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    StartSame,
    StartOther(u8),
    Toggle,
    Reset,
    Stop,
    Switch(bool),
    Ticks(u8),
    Duration(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::StartSame),
        (0u8..4).prop_map(Op::StartOther),
        Just(Op::Toggle),
        Just(Op::Reset),
        Just(Op::Stop),
        any::<bool>().prop_map(Op::Switch),
        (0u8..120).prop_map(Op::Ticks),
        (1u32..90).prop_map(Op::Duration),
    ]
}

fn apply(engine: &mut SessionEngine, op: &Op) {
    match op {
        Op::StartSame => {
            engine.start_focus("a", "Task A");
        }
        Op::StartOther(n) => {
            engine.start_focus(&format!("t{n}"), "Other");
        }
        Op::Toggle => {
            engine.toggle_running();
        }
        Op::Reset => {
            engine.reset();
        }
        Op::Stop => {
            engine.stop_focus();
        }
        Op::Switch(stopwatch) => {
            let mode = if *stopwatch {
                TimerMode::Stopwatch
            } else {
                TimerMode::Timer
            };
            engine.switch_mode(mode);
        }
        Op::Ticks(n) => {
            for _ in 0..*n {
                engine.tick();
            }
        }
        Op::Duration(minutes) => {
            engine.set_focus_minutes(*minutes).unwrap();
        }
    }
}

proptest! {
    #[test]
    fn remaining_never_exceeds_configured_total(ops in prop::collection::vec(op(), 0..60)) {
        let mut engine = SessionEngine::new(25).unwrap();
        for op in &ops {
            apply(&mut engine, op);
            prop_assert!(engine.remaining_secs() <= engine.total_secs());
            if engine.bound_task().is_none() {
                prop_assert_eq!(engine.state(), SessionState::Idle);
                prop_assert!(!engine.is_running());
            }
        }
    }

    #[test]
    fn pausing_on_same_task_keeps_remaining(ticks in prop::collection::vec(0u8..30, 1..12)) {
        let mut engine = SessionEngine::new(25).unwrap();
        engine.start_focus("a", "Task A");
        for n in ticks {
            for _ in 0..n {
                engine.tick();
            }
            let before = engine.remaining_secs();
            let was_running = engine.is_running();
            engine.start_focus("a", "Task A");
            prop_assert_eq!(engine.remaining_secs(), before);
            prop_assert_eq!(engine.is_running(), !was_running);
        }
    }

    #[test]
    fn reset_restores_active_counter(ops in prop::collection::vec(op(), 0..40)) {
        let mut engine = SessionEngine::new(25).unwrap();
        for op in &ops {
            apply(&mut engine, op);
        }
        let bound = engine.bound_task_id().map(str::to_string);
        let running = engine.is_running();
        engine.reset();
        match engine.mode() {
            TimerMode::Timer => prop_assert_eq!(engine.remaining_secs(), engine.total_secs()),
            TimerMode::Stopwatch => prop_assert_eq!(engine.elapsed_secs(), 0),
        }
        prop_assert_eq!(engine.bound_task_id().map(str::to_string), bound);
        prop_assert_eq!(engine.is_running(), running);
    }

    #[test]
    fn stop_always_returns_to_idle(ops in prop::collection::vec(op(), 0..40)) {
        let mut engine = SessionEngine::new(25).unwrap();
        for op in &ops {
            apply(&mut engine, op);
        }
        engine.stop_focus();
        prop_assert_eq!(engine.state(), SessionState::Idle);
        prop_assert!(engine.bound_task_id().is_none());
        prop_assert!(!engine.is_running());
        prop_assert_eq!(engine.elapsed_secs(), 0);
    }

    #[test]
    fn countdown_decreases_then_holds_at_zero(minutes in 1u32..3, extra in 0u64..30) {
        let mut engine = SessionEngine::new(minutes).unwrap();
        engine.start_focus("a", "Task A");
        let total = engine.total_secs();
        for expected in (0..total).rev() {
            engine.tick();
            prop_assert_eq!(engine.remaining_secs(), expected);
        }
        prop_assert!(!engine.is_running());
        for _ in 0..extra {
            engine.tick();
        }
        prop_assert_eq!(engine.remaining_secs(), 0);
        prop_assert_eq!(engine.bound_task_id(), Some("a"));
    }

    #[test]
    fn stopwatch_increases_without_bound(ticks in 0u64..500) {
        let mut engine = SessionEngine::new(1).unwrap();
        engine.start_focus("a", "Task A");
        engine.switch_mode(TimerMode::Stopwatch);
        engine.toggle_running();
        for n in 1..=ticks {
            engine.tick();
            prop_assert_eq!(engine.elapsed_secs(), n);
        }
        prop_assert!(engine.progress() < 1.0);
    }
}
