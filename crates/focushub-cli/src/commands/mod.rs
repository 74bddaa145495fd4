pub mod analytics;
pub mod config;
pub mod focus;
pub mod log;
pub mod plan;
pub mod settings;
pub mod status;
pub mod task;

use focushub_core::{App, Config};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load configuration (file plus environment) and the application state.
pub async fn load_app() -> Result<App, Box<dyn std::error::Error>> {
    let config = Config::load_or_default().with_env_overrides();
    Ok(App::load(&config).await?)
}

/// Wait for background backend calls before the process exits.
pub async fn finish(mut app: App) {
    app.flush().await;
    if !app.gateway().is_available() {
        tracing::debug!("offline: changes were not persisted");
    }
}
