//! Status command implementation

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use super::{progress_bar, Session};
use stepquest::progression::achievements::AchievementStatus;

/// Show level, streak, today's activity and the active pet
pub async fn status_command(config_override: Option<&PathBuf>, premium: bool, achievements: bool) -> Result<()> {
    let session = Session::open(config_override, premium)?;
    let snapshot = session.handle.snapshot();
    let profile = &snapshot.profile;

    println!("Level {} - {}", profile.level, profile.rank.title());
    match profile.xp_to_next() {
        Some(left) => println!(
            "  {} {} XP ({} to next level)",
            progress_bar(profile.progress_to_next() as f64, 20),
            profile.total_xp,
            left
        ),
        None => println!("  {} XP (max level)", profile.total_xp),
    }

    let streak = &snapshot.state.streak;
    println!("Streak: {} days (best {})", streak.current, streak.best);

    let steps = snapshot.today_steps();
    let goal = snapshot.step_goal;
    match snapshot.day() {
        Some(day) => println!(
            "Today ({day}): {steps}/{goal} steps {}",
            progress_bar(steps as f64 / goal as f64, 20)
        ),
        None => println!("No activity recorded yet."),
    }

    let views = snapshot.achievements();
    let unlocked = views.iter().filter(|v| v.status == AchievementStatus::Unlocked).count();
    let waiting = views
        .iter()
        .filter(|v| v.status == AchievementStatus::AwaitingPremium)
        .count();
    println!("Achievements: {unlocked}/{}", views.len());
    if waiting > 0 {
        println!("  {waiting} earned, waiting for premium");
    }

    if achievements {
        for view in &views {
            let marker = match view.status {
                AchievementStatus::Unlocked => "x",
                AchievementStatus::AwaitingPremium => "*",
                AchievementStatus::InProgress => "~",
                AchievementStatus::Locked => " ",
            };
            let def = view.achievement;
            println!(
                "  [{marker}] {} {} - {} ({}/{})",
                def.icon, def.name, def.description, view.progress.min(def.requirement), def.requirement
            );
        }
    }

    match snapshot.active_pet() {
        Some(pet) => {
            let mood = pet.mood(steps, Utc::now());
            println!(
                "Pet: {} the {} ({}, {}), {} XP",
                pet.name,
                pet.kind.display_name(),
                pet.stage(),
                mood.as_str(),
                pet.total_xp
            );
        }
        None => println!("Pet: none"),
    }

    let active = snapshot.state.challenges.active().count();
    if active > 0 {
        println!("Active challenges: {active}");
    }
    println!("Premium: {}", if snapshot.premium() { "active" } else { "inactive" });

    session.close().await
}
