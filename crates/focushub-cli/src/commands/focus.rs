//! Live focus session.
//!
//! Binds the timer to a task and redraws the clock once a second until the
//! countdown completes or the user presses Ctrl-C.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use focushub_core::timer::{format_clock, TimerMode};
use focushub_core::{App, Event};
use tokio::sync::broadcast::error::RecvError;

use super::{finish, load_app, CliResult};

#[derive(Args)]
pub struct FocusArgs {
    /// Task ID
    task_id: String,
    /// Count up instead of down
    #[arg(long)]
    stopwatch: bool,
    /// Record the session in the focus history when it ends
    #[arg(long)]
    log: bool,
}

fn redraw(app: &App) {
    let engine = app.timer().engine();
    let title = engine.bound_task_title().unwrap_or_default();
    let state = if engine.is_running() { "" } else { " (paused)" };
    print!("\r{}  {title}{state}   ", engine.clock());
    let _ = std::io::stdout().flush();
}

pub async fn run(args: FocusArgs) -> CliResult {
    let mut app = load_app().await?;
    let mut events = app.subscribe();

    app.start_focus(&args.task_id)?;
    if args.stopwatch {
        app.switch_mode(TimerMode::Stopwatch);
        app.toggle_timer();
    }
    redraw(&app);

    let mut display = tokio::time::interval(Duration::from_secs(1));
    let ended = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break app.stop_focus(),
            received = events.recv() => match received {
                Ok(event @ Event::FocusCompleted { .. }) => {
                    app.stop_focus();
                    break Some(event);
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break None,
            },
            _ = display.tick() => redraw(&app),
        }
    };
    println!();

    match &ended {
        Some(Event::FocusCompleted { focused_secs, .. }) => {
            println!("Session complete: {} focused", format_clock(*focused_secs));
        }
        Some(Event::FocusStopped { seconds, .. }) => {
            println!("Session stopped after {}", format_clock(*seconds));
        }
        _ => {}
    }

    if args.log {
        if let Some(entry) = ended.as_ref().and_then(|e| app.log_session(e)) {
            println!("Logged {} ({}%)", entry.duration, entry.percentage);
        }
    }

    finish(app).await;
    Ok(())
}
