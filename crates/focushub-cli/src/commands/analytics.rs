use chrono::Utc;
use clap::Args;
use focushub_core::analytics::DayHours;

use super::{finish, load_app, CliResult};

#[derive(Args)]
pub struct AnalyticsArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

fn print_days(heading: &str, days: &[DayHours]) {
    println!("{heading}");
    for d in days {
        let bar = "#".repeat((d.hours * 4.0).round() as usize);
        println!("  {} {}  {:>5.2}h {bar}", d.label, d.date.format("%m-%d"), d.hours);
    }
}

pub async fn run(args: AnalyticsArgs) -> CliResult {
    let app = load_app().await?;
    let report = app.analytics(Utc::now().date_naive());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let s = &report.summary;
        println!("Sessions:       {}", s.sessions);
        println!("Full sessions:  {}", s.full_sessions);
        println!("Avg completion: {:.0}%", s.average_percentage);
        println!("Total focus:    {}h {:02}m", s.total_minutes / 60, s.total_minutes % 60);
        println!();
        print_days("This week", &report.this_week);
        print_days("Last 7 days", &report.last_seven_days);
        println!();
        println!(
            "Tasks: {} work, {} personal",
            report.categories.work, report.categories.personal
        );
    }

    finish(app).await;
    Ok(())
}
