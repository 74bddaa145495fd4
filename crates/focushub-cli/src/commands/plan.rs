//! Day planner commands.

use clap::Subcommand;
use focushub_core::plan::PlanKind;

use super::{finish, load_app, CliResult};

#[derive(Subcommand)]
pub enum PlanAction {
    /// List planned entries in time order
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Plan an entry
    Add {
        /// Start time, HH:MM
        time: String,
        /// Title
        title: String,
        /// Duration label (e.g. "30m", "1h")
        #[arg(long, default_value = "30m")]
        duration: String,
        /// Mark as a focus block
        #[arg(long)]
        focus: bool,
    },
    /// Remove a planned entry
    Remove {
        /// Entry ID
        id: String,
    },
}

pub async fn run(action: PlanAction) -> CliResult {
    let mut app = load_app().await?;

    match action {
        PlanAction::List { json } => {
            let entries = app.planner().entries();
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else if entries.is_empty() {
                println!("nothing planned");
            } else {
                for e in entries {
                    let marker = match e.kind {
                        PlanKind::Focus => "*",
                        PlanKind::Default => " ",
                    };
                    println!("{} {marker} {:<8} {}  [{}]", e.time, e.duration, e.title, e.id);
                }
            }
        }
        PlanAction::Add {
            time,
            title,
            duration,
            focus,
        } => {
            let kind = if focus { PlanKind::Focus } else { PlanKind::Default };
            let entry = app.plan(&time, &title, &duration, kind)?;
            println!("Planned {} at {} ({})", entry.title, entry.time, entry.duration);
        }
        PlanAction::Remove { id } => {
            let removed = app.unplan(&id)?;
            println!("Removed {} at {}", removed.title, removed.time);
        }
    }

    finish(app).await;
    Ok(())
}
