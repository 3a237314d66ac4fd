//! Personal challenge commands

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::Utc;

use super::{parse_id, progress_bar, short_id, Session};
use stepquest::progression::challenges::{Challenge, ChallengeKind, ChallengeStatus};

/// Parse a kind name, accepting dashes in place of underscores
pub fn parse_kind(raw: &str) -> Result<ChallengeKind> {
    ChallengeKind::from_str(&raw.trim().to_lowercase().replace('-', "_")).ok_or_else(|| {
        let names: Vec<&str> = ChallengeKind::all().iter().map(|k| k.as_str()).collect();
        anyhow!("Unknown challenge kind '{raw}'. Available: {}", names.join(", "))
    })
}

fn print_challenge(challenge: &Challenge) {
    let now = Utc::now();
    let state = match &challenge.status {
        ChallengeStatus::Active => format!("{} days left", challenge.days_remaining(now)),
        ChallengeStatus::Completed { at } => format!("completed {}", at.format("%Y-%m-%d")),
        ChallengeStatus::Expired { at } => format!("expired {}", at.format("%Y-%m-%d")),
    };
    println!(
        "  {} {} {} {}/{} {} ({state}) +{} XP",
        short_id(&challenge.id),
        challenge.kind.title(),
        progress_bar(challenge.progress_ratio(), 10),
        challenge.progress,
        challenge.target,
        challenge.kind.unit(),
        challenge.xp_reward
    );
}

pub async fn challenge_create_command(
    config_override: Option<&PathBuf>,
    premium: bool,
    kind: &str,
    target: Option<u64>,
    days: u32,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let target = match target {
        Some(target) => target,
        None => kind.presets().first().copied().unwrap_or(1),
    };

    let session = Session::open(config_override, premium)?;
    let result = session.handle.create_challenge(kind, target, days).await;
    session.close().await?;

    let challenge = result?;
    println!("Challenge created:");
    println!("  id: {}", challenge.id);
    print_challenge(&challenge);
    Ok(())
}

pub async fn challenge_cancel_command(config_override: Option<&PathBuf>, premium: bool, id: &str) -> Result<()> {
    let id = parse_id(id)?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.cancel_challenge(id).await;
    session.close().await?;

    let challenge = result?;
    println!("Cancelled {} ({})", challenge.kind.title(), challenge.id);
    Ok(())
}

/// Active challenges, then history and stats
pub async fn challenge_list_command(config_override: Option<&PathBuf>, premium: bool, all: bool) -> Result<()> {
    let session = Session::open(config_override, premium)?;
    let snapshot = session.handle.snapshot();
    let book = &snapshot.state.challenges;

    let active: Vec<&Challenge> = book.active().collect();
    if active.is_empty() {
        println!("No active challenges.");
    } else {
        println!("Active challenges ({}):", active.len());
        for challenge in active {
            print_challenge(challenge);
        }
    }

    if all {
        let history: Vec<&Challenge> = book.history().collect();
        if !history.is_empty() {
            println!("\nHistory ({}):", history.len());
            for challenge in history {
                print_challenge(challenge);
            }
        }

        let stats = book.stats();
        println!(
            "\nCompleted {}, failed {}, success rate {:.0}%",
            stats.completed,
            stats.failed,
            stats.success_rate * 100.0
        );
    }

    session.close().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_accepts_dashes() {
        assert_eq!(parse_kind("weekly-steps").ok(), Some(ChallengeKind::WeeklySteps));
        assert_eq!(parse_kind("Daily_Calories").ok(), Some(ChallengeKind::DailyCalories));
        assert!(parse_kind("flying").is_err());
    }
}
