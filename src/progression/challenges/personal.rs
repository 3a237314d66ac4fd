//! Personal challenges

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{validate, ChallengeError, ChallengeKind, MetricTracker};
use crate::progression::activity::DailyActivity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChallengeStatus {
    Active,
    Completed { at: DateTime<Utc> },
    Expired { at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: Uuid,
    pub kind: ChallengeKind,
    pub target: u64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Never decreases
    pub progress: u64,
    pub xp_reward: u64,
    pub status: ChallengeStatus,
    pub tracker: MetricTracker,
}

impl Challenge {
    pub fn is_active(&self) -> bool {
        self.status == ChallengeStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, ChallengeStatus::Completed { .. })
    }

    /// Completion ratio (0.0 - 1.0)
    pub fn progress_ratio(&self) -> f64 {
        if self.target == 0 {
            return 0.0;
        }
        (self.progress as f64 / self.target as f64).min(1.0)
    }

    /// Whole days left until `end`
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.end - now).num_days().max(0)
    }
}

/// Challenges that changed state during one cycle
#[derive(Debug, Clone, Default)]
pub struct ChallengeUpdate {
    pub completed: Vec<Challenge>,
    pub expired: Vec<Challenge>,
}

impl ChallengeUpdate {
    pub fn xp(&self) -> u64 {
        self.completed.iter().map(|c| c.xp_reward).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChallengeStats {
    pub completed: usize,
    pub failed: usize,
    /// Completed over finished (0.0 when nothing finished)
    pub success_rate: f64,
}

/// Active challenges and finished history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeBook {
    challenges: Vec<Challenge>,
}

impl ChallengeBook {
    /// Start a challenge measured from `now` onward
    ///
    /// `today` is the activity already recorded for `day`, used as baseline.
    pub fn create(
        &mut self,
        kind: ChallengeKind,
        target: u64,
        duration_days: u32,
        now: DateTime<Utc>,
        day: NaiveDate,
        today: &DailyActivity,
    ) -> Result<Challenge, ChallengeError> {
        validate(target, duration_days)?;

        let challenge = Challenge {
            id: Uuid::new_v4(),
            kind,
            target,
            start: now,
            end: now + Duration::days(i64::from(duration_days)),
            progress: 0,
            xp_reward: kind.xp_reward(),
            status: ChallengeStatus::Active,
            tracker: MetricTracker::new(kind, day, today),
        };

        info!(id = %challenge.id, kind = %kind, target, duration_days, "Created challenge");
        self.challenges.push(challenge.clone());
        Ok(challenge)
    }

    /// Remove a challenge, active or finished
    pub fn cancel(&mut self, id: Uuid) -> Result<Challenge, ChallengeError> {
        let index = self
            .challenges
            .iter()
            .position(|c| c.id == id)
            .ok_or(ChallengeError::NotFound(id))?;
        Ok(self.challenges.remove(index))
    }

    /// Expire overdue challenges and progress the rest
    ///
    /// A challenge past its end is expired before today's values are looked
    /// at, so a late signal never completes it.
    pub fn advance(
        &mut self,
        day: NaiveDate,
        today: &DailyActivity,
        streak: u32,
        now: DateTime<Utc>,
    ) -> ChallengeUpdate {
        let mut update = ChallengeUpdate::default();

        for challenge in self.challenges.iter_mut().filter(|c| c.is_active()) {
            if now > challenge.end {
                challenge.status = ChallengeStatus::Expired { at: now };
                info!(id = %challenge.id, progress = challenge.progress, target = challenge.target, "Challenge expired");
                update.expired.push(challenge.clone());
                continue;
            }

            let value = challenge.tracker.observe(challenge.kind, day, today, streak);
            challenge.progress = challenge.progress.max(value.min(challenge.target));

            if challenge.progress >= challenge.target {
                challenge.status = ChallengeStatus::Completed { at: now };
                info!(id = %challenge.id, kind = %challenge.kind, "Challenge completed");
                update.completed.push(challenge.clone());
            }
        }

        update
    }

    pub fn get(&self, id: Uuid) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    pub fn all(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn active(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|c| c.is_active())
    }

    pub fn history(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|c| !c.is_active())
    }

    pub fn stats(&self) -> ChallengeStats {
        let completed = self.challenges.iter().filter(|c| c.is_completed()).count();
        let failed = self
            .challenges
            .iter()
            .filter(|c| matches!(c.status, ChallengeStatus::Expired { .. }))
            .count();
        let finished = completed + failed;
        let success_rate = if finished == 0 {
            0.0
        } else {
            completed as f64 / finished as f64
        };

        ChallengeStats {
            completed,
            failed,
            success_rate,
        }
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

    fn steps(n: u64) -> DailyActivity {
        DailyActivity {
            steps: n,
            ..Default::default()
        }
    }

    #[test]
    fn test_completes_once_with_reward() {
        let mut book = ChallengeBook::default();
        let created = book
            .create(ChallengeKind::DailySteps, 8_000, 3, at(1, 8), day(1), &steps(1_000))
            .unwrap();

        assert!(book.advance(day(1), &steps(8_500), 0, at(1, 12)).completed.is_empty());
        let update = book.advance(day(1), &steps(9_000), 0, at(1, 18));
        assert_eq!(update.completed.len(), 1);
        assert_eq!(update.xp(), 100);

        let again = book.advance(day(1), &steps(20_000), 0, at(1, 20));
        assert!(again.completed.is_empty());
        assert!(book.get(created.id).unwrap().is_completed());
        assert_eq!(book.get(created.id).unwrap().progress, 8_000);
    }

    #[test]
    fn test_expiry_checked_before_progress() {
        let mut book = ChallengeBook::default();
        book.create(ChallengeKind::WeeklySteps, 10_000, 1, at(1, 8), day(1), &steps(0))
            .unwrap();
        book.advance(day(1), &steps(4_000), 0, at(1, 20));

        let update = book.advance(day(2), &steps(30_000), 0, at(2, 9));
        assert_eq!(update.expired.len(), 1);
        assert!(update.completed.is_empty());
        assert_eq!(update.expired[0].progress, 4_000);
    }

    #[test]
    fn test_cancel_and_stats() {
        let mut book = ChallengeBook::default();
        let a = book
            .create(ChallengeKind::DailySteps, 5_000, 2, at(1, 8), day(1), &steps(0))
            .unwrap();
        let b = book
            .create(ChallengeKind::DailyCalories, 500, 1, at(1, 8), day(1), &steps(0))
            .unwrap();
        book.advance(day(1), &steps(6_000), 0, at(1, 10));
        book.advance(day(3), &steps(0), 0, at(3, 10));

        let stats = book.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);

        book.cancel(b.id).unwrap();
        assert!(book.get(a.id).is_some());
        assert_eq!(book.cancel(b.id), Err(ChallengeError::NotFound(b.id)));
        assert_eq!(book.history().count(), 1);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let mut book = ChallengeBook::default();
        assert_eq!(
            book.create(ChallengeKind::DailySteps, 0, 3, at(1, 8), day(1), &steps(0)),
            Err(ChallengeError::InvalidTarget)
        );
        assert!(book.all().is_empty());
    }
}
