use focushub_core::timer::format_clock;

use super::{finish, load_app, CliResult};

pub async fn run() -> CliResult {
    let app = load_app().await?;

    match app.gateway().client() {
        Ok(client) => println!("Backend:        online ({})", client.base_url()),
        Err(_) => println!("Backend:        offline"),
    }
    let settings = app.settings();
    println!("Language:       {}", settings.language);
    println!(
        "Focus duration: {} min ({})",
        settings.focus_duration,
        format_clock(u64::from(settings.focus_duration) * 60)
    );
    println!(
        "Breaks:         {} / {} min, long every {}",
        settings.short_break, settings.long_break, settings.long_break_interval
    );
    println!(
        "Tasks:          {} ({} open)",
        app.tasks().len(),
        app.tasks().filter_by(|t| !t.checked).len()
    );
    println!("Planned:        {}", app.planner().entries().len());

    finish(app).await;
    Ok(())
}
