use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focushub", version, about = "Focus Hub CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task list management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Day planner
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Focus history
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// User settings stored on the backend
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Local configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Focus analytics
    Analytics(commands::analytics::AnalyticsArgs),
    /// Run a focus session on a task
    Focus(commands::focus::FocusArgs),
    /// Backend availability and effective settings
    Status,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focushub=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Plan { action } => commands::plan::run(action).await,
        Commands::Log { action } => commands::log::run(action).await,
        Commands::Settings { action } => commands::settings::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Analytics(args) => commands::analytics::run(args).await,
        Commands::Focus(args) => commands::focus::run(args).await,
        Commands::Status => commands::status::run().await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
