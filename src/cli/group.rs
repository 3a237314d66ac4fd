//! Group challenge commands

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use super::challenge::parse_kind;
use super::{parse_id, progress_bar, Session};
use stepquest::progression::challenges::{GroupChallenge, ParticipantProgress, LOCAL_PARTICIPANT_ID};

/// Parse `id:name[:progress]`
pub fn parse_participant(raw: &str) -> Result<ParticipantProgress> {
    let mut parts = raw.splitn(3, ':');
    let id = parts.next().unwrap_or_default().trim();
    let name = parts.next().unwrap_or_default().trim();
    if id.is_empty() || name.is_empty() {
        bail!("Participant must look like id:name[:progress], got '{raw}'");
    }

    let progress = match parts.next() {
        Some(p) => p
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Invalid progress for participant '{id}': {p}"))?,
        None => 0,
    };

    Ok(ParticipantProgress {
        id: id.to_string(),
        name: name.to_string(),
        progress,
    })
}

fn print_group(group: &GroupChallenge) {
    let now = Utc::now();
    let state = if group.is_active(now) {
        format!("{} days left", group.days_remaining(now))
    } else {
        "ended".to_string()
    };
    println!("{} [{}] ({state})", group.name, group.id);
    println!(
        "  {} {} {}/{} {}{}",
        group.kind.title(),
        progress_bar(group.team_progress(), 20),
        group.total_progress(),
        group.target,
        group.kind.unit(),
        if group.is_goal_reached() { " - goal reached" } else { "" }
    );
    for standing in group.standings() {
        let you = if standing.id == LOCAL_PARTICIPANT_ID { " (you)" } else { "" };
        println!("  {}. {}{you}: {}", standing.rank, standing.name, standing.progress);
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn group_create_command(
    config_override: Option<&PathBuf>,
    premium: bool,
    name: &str,
    kind: &str,
    target: u64,
    days: u32,
    participants: &[String],
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let participants = participants
        .iter()
        .map(|raw| parse_participant(raw))
        .collect::<Result<Vec<_>>>()?;

    let session = Session::open(config_override, premium)?;
    let result = session
        .handle
        .create_group_challenge(name, kind, target, days, participants)
        .await;
    session.close().await?;

    print_group(&result?);
    Ok(())
}

pub async fn group_sync_command(
    config_override: Option<&PathBuf>,
    premium: bool,
    id: &str,
    participants: &[String],
) -> Result<()> {
    let id = parse_id(id)?;
    let updates = participants
        .iter()
        .map(|raw| parse_participant(raw))
        .collect::<Result<Vec<_>>>()?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.sync_group_progress(id, updates).await;
    session.close().await?;

    print_group(&result?);
    Ok(())
}

pub async fn group_delete_command(config_override: Option<&PathBuf>, premium: bool, id: &str) -> Result<()> {
    let id = parse_id(id)?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.delete_group_challenge(id).await;
    session.close().await?;

    let group = result?;
    println!("Deleted group challenge {}", group.name);
    Ok(())
}

pub async fn group_list_command(config_override: Option<&PathBuf>, premium: bool) -> Result<()> {
    let session = Session::open(config_override, premium)?;
    let snapshot = session.handle.snapshot();

    let groups = snapshot.state.groups.all();
    if groups.is_empty() {
        println!("No group challenges.");
    }
    for group in groups {
        print_group(group);
        println!();
    }

    session.close().await
}
