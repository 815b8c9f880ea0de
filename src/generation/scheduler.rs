//! Background scheduler for configured weekly generation runs.
//!
//! Users pick a generation day and time in their settings; this loop
//! checks once a minute and triggers at most one job per user per week.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use tracing::{error, info};

use super::{GenerateWeekParams, WeeklyGenerator};
use crate::db::{self, Database};

/// Run the weekly-generation scheduler loop forever.
pub async fn run_loop(db: Database, generator: Arc<WeeklyGenerator>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "Weekly generation scheduler started");

    loop {
        if let Err(e) = tick(&db, &generator).await {
            error!("Scheduler tick failed: {e:#}");
        }

        tokio::time::sleep(interval).await;
    }
}

/// Check every user's configured generation day/time once.
async fn tick(db: &Database, generator: &WeeklyGenerator) -> Result<()> {
    let now = Utc::now();
    // Settings store 0-6, Sunday-Saturday.
    let today = i64::from(now.weekday().num_days_from_sunday());
    let time_now = now.format("%H:%M").to_string();

    let due = db::list_settings_for_day(db.pool(), today).await?;

    for settings in due {
        // HH:MM strings compare correctly lexically.
        if settings.weekly_generation_time > time_now {
            continue;
        }

        let week_start = next_monday(now.date_naive()).format("%Y-%m-%d").to_string();

        if db::generation_job_exists_for_week(db.pool(), settings.user_id, &week_start).await? {
            continue;
        }

        info!(
            user_id = settings.user_id,
            week = %week_start,
            "Triggering scheduled weekly generation"
        );

        let params = GenerateWeekParams {
            start_date: week_start,
            platforms: None,
            research_first: true,
            auto_approve: settings.auto_approve_enabled,
        };

        if let Err(e) = generator.generate_week(settings.user_id, &params).await {
            error!(user_id = settings.user_id, "Scheduled generation failed: {e:#}");
        }
    }

    Ok(())
}

/// The Monday of the upcoming week (always in the future).
fn next_monday(today: NaiveDate) -> NaiveDate {
    let days_ahead = i64::from(7 - today.weekday().num_days_from_monday());
    today + ChronoDuration::days(days_ahead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_monday() {
        // 2026-03-02 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(next_monday(monday), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());

        let wednesday = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(next_monday(wednesday), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());

        let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        assert_eq!(next_monday(sunday), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
    }
}
