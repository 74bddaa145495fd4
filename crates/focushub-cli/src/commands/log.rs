//! Focus history commands.

use chrono::Utc;
use clap::Subcommand;
use focushub_core::LogEntry;

use super::{finish, load_app, CliResult};

#[derive(Subcommand)]
pub enum LogAction {
    /// List recent focus sessions, newest first
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a focus session by hand
    Add {
        /// Session title
        title: String,
        /// Minutes actually focused
        #[arg(long)]
        focused: u64,
        /// Planned minutes (defaults to the focus duration setting)
        #[arg(long)]
        planned: Option<u64>,
    },
}

pub async fn run(action: LogAction) -> CliResult {
    let mut app = load_app().await?;

    match action {
        LogAction::List { json } => {
            let entries = app.history().entries();
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else {
                for e in entries {
                    println!("{}  {:>5}  {:>3}%  {}", e.time, e.duration, e.percentage, e.title);
                }
                let total = app.history().total_focus_minutes();
                println!("Total focus: {}h {:02}m", total / 60, total % 60);
            }
        }
        LogAction::Add {
            title,
            focused,
            planned,
        } => {
            let planned = planned.unwrap_or(u64::from(app.settings().focus_duration));
            let entry = LogEntry::from_session(&title, focused * 60, planned * 60, Utc::now());
            let entry = app.record_log(entry);
            println!("Logged {} {} ({}%)", entry.title, entry.duration, entry.percentage);
        }
    }

    finish(app).await;
    Ok(())
}
