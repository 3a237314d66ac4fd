//! Feed command: push one activity snapshot through the coordinator

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use super::Session;
use stepquest::ActivitySnapshot;

/// Raw values as typed on the command line
pub struct FeedArgs {
    pub steps: i64,
    pub lifetime: Option<i64>,
    pub distance: f64,
    pub calories: f64,
    pub active_minutes: i64,
    pub date: Option<String>,
}

pub async fn feed_command(config_override: Option<&PathBuf>, premium: bool, args: FeedArgs) -> Result<()> {
    let date = match &args.date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {raw}"))?,
        None => Local::now().date_naive(),
    };

    let session = Session::open(config_override, premium)?;

    // Without an explicit lifetime total, add today's count to the days already recorded
    let lifetime = match args.lifetime {
        Some(total) => total,
        None => {
            let snapshot = session.handle.snapshot();
            let ledger = &snapshot.state.profile.activity;
            let earlier = if ledger.day == Some(date) {
                ledger.lifetime_steps.saturating_sub(ledger.today.steps)
            } else {
                ledger.lifetime_steps
            };
            (earlier as i64).saturating_add(args.steps.max(0))
        }
    };

    let signal = ActivitySnapshot::steps(date, args.steps, lifetime)
        .with_distance(args.distance)
        .with_calories(args.calories)
        .with_active_minutes(args.active_minutes);

    let delta = session.handle.on_activity_update(signal).await?;

    if delta.events.is_empty() {
        println!("No progress this time.");
    } else {
        for event in &delta.events {
            println!("  {event}");
        }
    }

    let profile = &delta.snapshot.profile;
    println!();
    println!(
        "Level {} ({}), {} XP total, streak {} days",
        profile.level,
        profile.rank.title(),
        profile.total_xp,
        delta.new_streak
    );

    session.close().await
}
