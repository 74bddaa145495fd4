//! Task list commands.

use clap::Subcommand;
use focushub_core::task::{Category, Priority, Task, TaskFilter};

use super::{finish, load_app, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        /// Filter: all, work or personal
        #[arg(long, default_value = "all")]
        filter: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a task at the top of the list
    Add {
        /// Task title
        title: String,
        /// Priority: high, medium or low
        #[arg(long)]
        priority: Option<String>,
        /// Category: work or personal
        #[arg(long)]
        category: Option<String>,
    },
    /// Change a task title
    Rename {
        /// Task ID
        id: String,
        /// New title
        title: String,
    },
    /// Check or uncheck a task
    Toggle {
        /// Task ID
        id: String,
    },
    /// Remove a task
    Remove {
        /// Task ID
        id: String,
    },
    /// Add a task to today's plan at 12:00
    Plan {
        /// Task ID
        id: String,
    },
}

fn print_task(task: &Task) {
    let mark = if task.checked { "x" } else { " " };
    println!(
        "[{mark}] {:<38} {} ({}, {})",
        task.id, task.title, task.priority, task.category
    );
}

pub async fn run(action: TaskAction) -> CliResult {
    let mut app = load_app().await?;

    match action {
        TaskAction::List { filter, json } => {
            let filter: TaskFilter = filter.parse()?;
            let tasks = app.filtered_tasks(filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("no tasks");
            } else {
                tasks.into_iter().for_each(print_task);
            }
        }
        TaskAction::Add {
            title,
            priority,
            category,
        } => {
            let priority: Priority = priority.map(|p| p.parse()).transpose()?.unwrap_or_default();
            let category: Category = category.map(|c| c.parse()).transpose()?.unwrap_or_default();

            let task = app.add_task_with(&title, priority, category)?;
            println!("Task added: {}", task.id);
            println!("{}", serde_json::to_string_pretty(task)?);
        }
        TaskAction::Rename { id, title } => {
            app.rename_task(&id, &title)?;
            println!("Task renamed: {id}");
        }
        TaskAction::Toggle { id } => {
            let checked = app.toggle_task(&id)?;
            println!("Task {id} {}", if checked { "checked" } else { "unchecked" });
        }
        TaskAction::Remove { id } => {
            let removed = app.remove_task(&id)?;
            println!("Task removed: {}", removed.title);
        }
        TaskAction::Plan { id } => {
            let entry = app.add_to_plan(&id)?;
            println!("Planned {} at {} ({})", entry.title, entry.time, entry.duration);
        }
    }

    finish(app).await;
    Ok(())
}
