//! Analytics over focus history and tasks.
//!
//! Day buckets use the UTC date of each entry's `created_at`; entries without
//! a timestamp (sample data) only count toward the summary.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::history::LogEntry;
use crate::task::{Category, Task};

/// Parse a duration label into minutes.
///
/// Accepts "+25m", "30m", "1h", "2h 00m", "1h30m" and bare minute counts.
pub fn parse_duration_minutes(label: &str) -> Option<u32> {
    let label = label.trim();
    let label = label.strip_prefix('+').unwrap_or(label);

    let mut total: u32 = 0;
    let mut digits = String::new();
    let mut seen = false;

    for c in label.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'h' | 'H' | 'm' | 'M' => {
                let n: u32 = digits.parse().ok()?;
                digits.clear();
                let factor = if c.eq_ignore_ascii_case(&'h') { 60 } else { 1 };
                total = total.checked_add(n.checked_mul(factor)?)?;
                seen = true;
            }
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }
    if !digits.is_empty() {
        total = total.checked_add(digits.parse().ok()?)?;
        seen = true;
    }
    seen.then_some(total)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FocusSummary {
    pub sessions: usize,
    /// Sessions that reached 100%.
    pub full_sessions: usize,
    pub average_percentage: f64,
    pub total_minutes: u32,
}

impl FocusSummary {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let sessions = entries.len();
        let percent_sum: u32 = entries.iter().map(|e| u32::from(e.percentage)).sum();
        Self {
            sessions,
            full_sessions: entries.iter().filter(|e| e.percentage >= 100).count(),
            average_percentage: f64::from(percent_sum) / sessions as f64,
            total_minutes: entries.iter().map(LogEntry::minutes).sum(),
        }
    }
}

/// Focused hours on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHours {
    pub date: NaiveDate,
    /// Short weekday name, "Mon" .. "Sun".
    pub label: String,
    pub hours: f64,
}

fn hours_on(entries: &[LogEntry], date: NaiveDate) -> f64 {
    let minutes: u32 = entries
        .iter()
        .filter(|e| e.created_at.is_some_and(|at| at.date_naive() == date))
        .map(LogEntry::minutes)
        .sum();
    f64::from(minutes) / 60.0
}

fn day(entries: &[LogEntry], date: NaiveDate) -> DayHours {
    DayHours {
        date,
        label: weekday_label(date.weekday()).to_string(),
        hours: hours_on(entries, date),
    }
}

fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Hours per day for the ISO week containing `today`, Monday first.
pub fn weekly_hours(entries: &[LogEntry], today: NaiveDate) -> Vec<DayHours> {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (0..7)
        .map(|offset| day(entries, monday + Duration::days(offset)))
        .collect()
}

/// Hours per day for the seven days ending with `today`, oldest first.
pub fn last_seven_days(entries: &[LogEntry], today: NaiveDate) -> Vec<DayHours> {
    (0..7)
        .rev()
        .map(|back| day(entries, today - Duration::days(back)))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub work: usize,
    pub personal: usize,
}

pub fn category_breakdown(tasks: &[Task]) -> CategoryBreakdown {
    tasks
        .iter()
        .fold(CategoryBreakdown::default(), |mut acc, task| {
            match task.category {
                Category::Work => acc.work += 1,
                Category::Personal => acc.personal += 1,
            }
            acc
        })
}

/// Everything the analytics view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub summary: FocusSummary,
    pub this_week: Vec<DayHours>,
    pub last_seven_days: Vec<DayHours>,
    pub categories: CategoryBreakdown,
}

impl AnalyticsReport {
    pub fn build(entries: &[LogEntry], tasks: &[Task], today: NaiveDate) -> Self {
        Self {
            summary: FocusSummary::from_entries(entries),
            this_week: weekly_hours(entries, today),
            last_seven_days: last_seven_days(entries, today),
            categories: category_breakdown(tasks),
        }
    }
}
