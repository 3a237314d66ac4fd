//! Daily quest commands

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::{progress_bar, Session};
use stepquest::progression::quests::DailyQuest;

fn print_quest(quest: &DailyQuest) {
    let marker = if quest.is_completed() { "x" } else { " " };
    let premium = if quest.is_premium { " (premium)" } else { "" };
    println!(
        "  {}. [{marker}] {}{premium} {} {}/{} +{} XP",
        quest.slot,
        quest.title,
        progress_bar(quest.progress_ratio(), 10),
        quest.progress,
        quest.requirement,
        quest.xp_reward
    );
    println!("     id: {}", quest.id);
}

/// List today's quests
pub async fn quests_command(config_override: Option<&PathBuf>, premium: bool) -> Result<()> {
    let session = Session::open(config_override, premium)?;
    let snapshot = session.handle.snapshot();

    match snapshot.state.quests.day {
        Some(day) => {
            println!("Quests for {day}:");
            for quest in snapshot.quests() {
                print_quest(quest);
            }
        }
        None => println!("No quests yet. Feed some activity first."),
    }

    session.close().await
}

/// Swap a quest for another one; `target` is a quest id or a slot number
pub async fn refresh_quest_command(config_override: Option<&PathBuf>, premium: bool, target: &str) -> Result<()> {
    let session = Session::open(config_override, premium)?;

    let quest_id = match target.parse::<u8>() {
        Ok(slot) => {
            let snapshot = session.handle.snapshot();
            match snapshot.quests().iter().find(|q| q.slot == slot) {
                Some(quest) => quest.id.clone(),
                None => {
                    session.close().await?;
                    bail!("No quest in slot {slot}");
                }
            }
        }
        Err(_) => target.to_string(),
    };

    let result = session.handle.refresh_quest(&quest_id).await;
    session.close().await?;

    let quest = result?;
    println!("New quest:");
    print_quest(&quest);
    Ok(())
}
