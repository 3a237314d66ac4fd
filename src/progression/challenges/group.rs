//! Group challenges
//!
//! Remote participants' progress is supplied from outside and replaced on
//! every sync; only the local participant is computed here. Totals and
//! ranks are derived on read and never stored.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{validate, ChallengeError, ChallengeKind, MetricTracker};
use crate::progression::activity::DailyActivity;

/// Participant ID of the device owner
pub const LOCAL_PARTICIPANT_ID: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupParticipant {
    pub id: String,
    pub name: String,
    pub progress: u64,
}

impl GroupParticipant {
    pub fn is_local(&self) -> bool {
        self.id == LOCAL_PARTICIPANT_ID
    }
}

/// Progress reported for a remote participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantProgress {
    pub id: String,
    pub name: String,
    pub progress: u64,
}

/// A participant's computed place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub id: String,
    pub name: String,
    pub progress: u64,
    /// 1-based
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChallenge {
    pub id: Uuid,
    pub name: String,
    pub kind: ChallengeKind,
    pub target: u64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Supplied order, used as the tie-break
    pub participants: Vec<GroupParticipant>,
    pub creator_id: String,
    pub tracker: MetricTracker,
    /// Set the first time the team goal is observed reached
    #[serde(default)]
    pub goal_reached_at: Option<DateTime<Utc>>,
}

impl GroupChallenge {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.end - now).num_days().max(0)
    }

    pub fn total_progress(&self) -> u64 {
        self.participants
            .iter()
            .fold(0u64, |total, p| total.saturating_add(p.progress))
    }

    /// Team completion ratio (0.0 - 1.0)
    pub fn team_progress(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        (self.total_progress() as f64 / self.target as f64).min(1.0)
    }

    pub fn is_goal_reached(&self) -> bool {
        self.total_progress() >= self.target
    }

    pub fn local(&self) -> Option<&GroupParticipant> {
        self.participants.iter().find(|p| p.is_local())
    }

    /// Participants by progress, highest first; equal progress keeps list order
    pub fn standings(&self) -> Vec<Standing> {
        let mut order: Vec<(usize, &GroupParticipant)> = self.participants.iter().enumerate().collect();
        order.sort_by(|(ia, a), (ib, b)| b.progress.cmp(&a.progress).then(ia.cmp(ib)));

        order
            .into_iter()
            .enumerate()
            .map(|(place, (_, p))| Standing {
                id: p.id.clone(),
                name: p.name.clone(),
                progress: p.progress,
                rank: place + 1,
            })
            .collect()
    }

    pub fn local_rank(&self) -> Option<usize> {
        self.standings()
            .into_iter()
            .find(|s| s.id == LOCAL_PARTICIPANT_ID)
            .map(|s| s.rank)
    }

    /// Replace remote progress; unknown participants are appended
    pub fn sync(&mut self, updates: &[ParticipantProgress]) {
        for update in updates {
            if update.id == LOCAL_PARTICIPANT_ID {
                debug!(challenge = %self.id, "Ignoring remote progress for the local participant");
                continue;
            }
            match self.participants.iter_mut().find(|p| p.id == update.id) {
                Some(participant) => {
                    participant.progress = update.progress;
                    if !update.name.is_empty() {
                        participant.name = update.name.clone();
                    }
                }
                None => self.participants.push(GroupParticipant {
                    id: update.id.clone(),
                    name: update.name.clone(),
                    progress: update.progress,
                }),
            }
        }
    }
}

/// All group challenges the local participant belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupChallenges {
    groups: Vec<GroupChallenge>,
}

impl GroupChallenges {
    /// Start a group challenge; requires premium
    ///
    /// The local participant is put first when `participants` lacks it.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        name: &str,
        kind: ChallengeKind,
        target: u64,
        duration_days: u32,
        participants: Vec<ParticipantProgress>,
        premium: bool,
        now: DateTime<Utc>,
        day: NaiveDate,
        today: &DailyActivity,
    ) -> Result<GroupChallenge, ChallengeError> {
        if !premium {
            return Err(ChallengeError::PremiumRequired);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ChallengeError::MissingName);
        }
        validate(target, duration_days)?;

        let mut members: Vec<GroupParticipant> = Vec::with_capacity(participants.len() + 1);
        for p in participants {
            if members.iter().any(|m| m.id == p.id) {
                continue;
            }
            let progress = if p.id == LOCAL_PARTICIPANT_ID { 0 } else { p.progress };
            members.push(GroupParticipant {
                id: p.id,
                name: p.name,
                progress,
            });
        }
        if !members.iter().any(GroupParticipant::is_local) {
            members.insert(
                0,
                GroupParticipant {
                    id: LOCAL_PARTICIPANT_ID.to_string(),
                    name: "You".to_string(),
                    progress: 0,
                },
            );
        }

        let group = GroupChallenge {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            target,
            start: now,
            end: now + Duration::days(i64::from(duration_days)),
            participants: members,
            creator_id: LOCAL_PARTICIPANT_ID.to_string(),
            tracker: MetricTracker::new(kind, day, today),
            goal_reached_at: None,
        };

        info!(id = %group.id, name = %group.name, participants = group.participants.len(), "Created group challenge");
        self.groups.push(group.clone());
        Ok(group)
    }

    /// Progress the local participant of every running group
    ///
    /// Returns the IDs whose team goal is reached for the first time.
    pub fn advance(&mut self, day: NaiveDate, today: &DailyActivity, streak: u32, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut reached = Vec::new();
        for group in self.groups.iter_mut().filter(|g| g.is_active(now)) {
            let value = group.tracker.observe(group.kind, day, today, streak);
            if let Some(local) = group.participants.iter_mut().find(|p| p.is_local()) {
                local.progress = local.progress.max(value);
            }
            if group.goal_reached_at.is_none() && group.is_goal_reached() {
                info!(id = %group.id, "Group challenge goal reached");
                group.goal_reached_at = Some(now);
                reached.push(group.id);
            }
        }
        reached
    }

    pub fn sync(&mut self, id: Uuid, updates: &[ParticipantProgress]) -> Result<&GroupChallenge, ChallengeError> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(ChallengeError::NotFound(id))?;
        group.sync(updates);
        Ok(group)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<GroupChallenge, ChallengeError> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or(ChallengeError::NotFound(id))?;
        Ok(self.groups.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&GroupChallenge> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn all(&self) -> &[GroupChallenge] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, d, hour, 0, 0).unwrap()
    }

    fn friend(id: &str, progress: u64) -> ParticipantProgress {
        ParticipantProgress {
            id: id.to_string(),
            name: id.to_uppercase(),
            progress,
        }
    }

    fn steps(n: u64) -> DailyActivity {
        DailyActivity {
            steps: n,
            ..Default::default()
        }
    }

    fn group(groups: &mut GroupChallenges) -> GroupChallenge {
        groups
            .create(
                "Office",
                ChallengeKind::WeeklySteps,
                100_000,
                7,
                vec![friend("user", 999), friend("anna", 0), friend("ben", 0)],
                true,
                at(1, 8),
                day(1),
                &steps(0),
            )
            .unwrap()
    }

    #[test]
    fn test_requires_premium() {
        let mut groups = GroupChallenges::default();
        let err = groups.create(
            "Office",
            ChallengeKind::WeeklySteps,
            100_000,
            7,
            vec![],
            false,
            at(1, 8),
            day(1),
            &steps(0),
        );
        assert_eq!(err, Err(ChallengeError::PremiumRequired));
    }

    #[test]
    fn test_tie_break_by_position() {
        let mut groups = GroupChallenges::default();
        let created = group(&mut groups);
        let mut g = groups
            .sync(created.id, &[friend("anna", 50), friend("ben", 30)])
            .unwrap()
            .clone();
        g.participants[0].progress = 50;

        let ranks: Vec<(String, usize)> = g.standings().into_iter().map(|s| (s.id, s.rank)).collect();
        assert_eq!(
            ranks,
            vec![
                ("user".to_string(), 1),
                ("anna".to_string(), 2),
                ("ben".to_string(), 3)
            ]
        );
        assert_eq!(g.standings(), g.standings());
        assert_eq!(g.local_rank(), Some(1));
    }

    #[test]
    fn test_sync_replaces_remote_and_ignores_local() {
        let mut groups = GroupChallenges::default();
        let created = group(&mut groups);
        groups.sync(created.id, &[friend("anna", 800)]).unwrap();
        groups
            .sync(created.id, &[friend("anna", 500), friend("user", 7_000), friend("cara", 20)])
            .unwrap();

        let g = groups.get(created.id).unwrap();
        assert_eq!(g.participants.len(), 4);
        assert_eq!(g.participants[1].progress, 500);
        assert_eq!(g.local().unwrap().progress, 0);
        assert_eq!(g.total_progress(), 520);
    }

    #[test]
    fn test_local_progress_is_monotonic_and_goal_reported_once() {
        let mut groups = GroupChallenges::default();
        let created = group(&mut groups);
        groups.sync(created.id, &[friend("anna", 90_000)]).unwrap();

        assert!(groups.advance(day(1), &steps(6_000), 0, at(1, 12)).is_empty());
        assert_eq!(groups.advance(day(1), &steps(11_000), 0, at(1, 18)), vec![created.id]);
        assert!(groups.advance(day(1), &steps(3_000), 0, at(1, 19)).is_empty());

        let g = groups.get(created.id).unwrap();
        assert_eq!(g.local().unwrap().progress, 11_000);
        assert!(g.is_goal_reached());
        assert!((g.team_progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_goal_not_reported_again_after_remote_drop() {
        let mut groups = GroupChallenges::default();
        let created = group(&mut groups);
        groups.sync(created.id, &[friend("anna", 95_000)]).unwrap();
        assert_eq!(groups.advance(day(1), &steps(6_000), 0, at(1, 12)), vec![created.id]);

        // A lower remote report takes the team back under the target
        groups.sync(created.id, &[friend("anna", 50_000)]).unwrap();
        assert!(!groups.get(created.id).unwrap().is_goal_reached());

        groups.sync(created.id, &[friend("anna", 99_000)]).unwrap();
        assert!(groups.advance(day(1), &steps(7_000), 0, at(1, 18)).is_empty());
        assert_eq!(groups.get(created.id).unwrap().goal_reached_at, Some(at(1, 12)));
    }

    #[test]
    fn test_huge_remote_progress_saturates() {
        let mut groups = GroupChallenges::default();
        let created = group(&mut groups);
        let half = u64::MAX / 2 + 1;
        groups
            .sync(created.id, &[friend("anna", half), friend("ben", half)])
            .unwrap();

        let g = groups.get(created.id).unwrap();
        assert_eq!(g.total_progress(), u64::MAX);
        assert!(g.is_goal_reached());
        assert!((g.team_progress() - 1.0).abs() < f64::EPSILON);
        assert_eq!(g.local_rank(), Some(3));
    }

    #[test]
    fn test_inactive_after_end() {
        let mut groups = GroupChallenges::default();
        let created = group(&mut groups);
        assert!(!created.is_active(at(9, 8)));
        groups.advance(day(9), &steps(50_000), 0, at(9, 8));
        assert_eq!(groups.get(created.id).unwrap().local().unwrap().progress, 0);
        assert_eq!(created.days_remaining(at(3, 8)), 5);

        groups.delete(created.id).unwrap();
        assert!(groups.all().is_empty());
    }
}
