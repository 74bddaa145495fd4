use clap::Subcommand;
use focushub_core::settings::{Settings, SettingsPatch};

use super::{finish, load_app, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting (e.g. "focus_duration", "language")
    Get {
        /// Setting name
        key: String,
    },
    /// Change a setting and save it to the backend
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
}

pub async fn run(action: SettingsAction) -> CliResult {
    let mut app = load_app().await?;

    match action {
        SettingsAction::Get { key } => match app.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            }
        },
        SettingsAction::Set { key, value } => {
            let patch = SettingsPatch::from_key_value(&key, &value)?;
            app.update_settings(patch)?;
            if !app.gateway().is_available() {
                eprintln!("warning: backend offline, setting applies to this run only");
            }
            println!("ok");
        }
        SettingsAction::List => {
            for key in Settings::keys() {
                if let Some(value) = app.settings().get(&key) {
                    println!("{key} = {value}");
                }
            }
        }
    }

    finish(app).await;
    Ok(())
}
