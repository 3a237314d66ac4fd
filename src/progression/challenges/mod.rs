//! Challenge Engine
//!
//! Personal challenges with a target, a deadline, and a terminal outcome, and
//! group challenges whose standings are recomputed on every read. Both measure
//! activity only from the moment they were created.

mod group;
mod personal;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::activity::DailyActivity;

pub use group::{
    GroupChallenge, GroupChallenges, GroupParticipant, ParticipantProgress, Standing,
    LOCAL_PARTICIPANT_ID,
};
pub use personal::{
    Challenge, ChallengeBook, ChallengeStats, ChallengeStatus, ChallengeUpdate,
};

/// Longest allowed challenge, in days
pub const MAX_DURATION_DAYS: u32 = 365;

/// Metric a challenge is measured by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    DailySteps,
    WeeklySteps,
    /// Meters
    WeeklyDistance,
    StreakDays,
    DailyCalories,
    ActiveMinutes,
}

/// How daily values combine into challenge progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Best single day since creation
    BestDay,
    /// Sum of all days since creation
    Cumulative,
    /// Consecutive goal days since creation
    Streak,
}

impl ChallengeKind {
    pub fn all() -> &'static [ChallengeKind] {
        &[
            ChallengeKind::DailySteps,
            ChallengeKind::WeeklySteps,
            ChallengeKind::WeeklyDistance,
            ChallengeKind::StreakDays,
            ChallengeKind::DailyCalories,
            ChallengeKind::ActiveMinutes,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeKind::DailySteps => "daily_steps",
            ChallengeKind::WeeklySteps => "weekly_steps",
            ChallengeKind::WeeklyDistance => "weekly_distance",
            ChallengeKind::StreakDays => "streak_days",
            ChallengeKind::DailyCalories => "daily_calories",
            ChallengeKind::ActiveMinutes => "active_minutes",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChallengeKind::DailySteps => "Steps in a day",
            ChallengeKind::WeeklySteps => "Steps in a week",
            ChallengeKind::WeeklyDistance => "Distance in a week",
            ChallengeKind::StreakDays => "Days in a row",
            ChallengeKind::DailyCalories => "Calories in a day",
            ChallengeKind::ActiveMinutes => "Active minutes",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ChallengeKind::DailySteps | ChallengeKind::WeeklySteps => "steps",
            ChallengeKind::WeeklyDistance => "m",
            ChallengeKind::StreakDays => "days",
            ChallengeKind::DailyCalories => "kcal",
            ChallengeKind::ActiveMinutes => "min",
        }
    }

    /// Suggested targets
    pub fn presets(&self) -> &'static [u64] {
        match self {
            ChallengeKind::DailySteps => &[5_000, 8_000, 10_000, 12_000, 15_000, 20_000],
            ChallengeKind::WeeklySteps => &[35_000, 50_000, 70_000, 100_000],
            ChallengeKind::WeeklyDistance => &[10_000, 20_000, 30_000, 50_000, 100_000],
            ChallengeKind::StreakDays => &[3, 7, 14, 21, 30],
            ChallengeKind::DailyCalories => &[300, 500, 700, 1_000],
            ChallengeKind::ActiveMinutes => &[150, 300, 600],
        }
    }

    /// XP paid when a personal challenge of this kind completes
    pub fn xp_reward(&self) -> u64 {
        match self {
            ChallengeKind::DailySteps | ChallengeKind::DailyCalories => 100,
            ChallengeKind::WeeklySteps | ChallengeKind::WeeklyDistance => 250,
            ChallengeKind::StreakDays => 300,
            ChallengeKind::ActiveMinutes => 150,
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            ChallengeKind::DailySteps | ChallengeKind::DailyCalories => Aggregation::BestDay,
            ChallengeKind::WeeklySteps
            | ChallengeKind::WeeklyDistance
            | ChallengeKind::ActiveMinutes => Aggregation::Cumulative,
            ChallengeKind::StreakDays => Aggregation::Streak,
        }
    }

    /// Today's raw value for this metric
    pub fn daily_value(&self, today: &DailyActivity) -> u64 {
        match self {
            ChallengeKind::DailySteps | ChallengeKind::WeeklySteps => today.steps,
            ChallengeKind::WeeklyDistance => today.distance_meters as u64,
            ChallengeKind::DailyCalories => today.calories as u64,
            ChallengeKind::ActiveMinutes => today.active_minutes,
            ChallengeKind::StreakDays => 0,
        }
    }
}

impl std::fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("challenge target must be greater than zero")]
    InvalidTarget,

    #[error("challenge duration must be between 1 and {MAX_DURATION_DAYS} days, got {0}")]
    InvalidDuration(u32),

    #[error("challenge not found: {0}")]
    NotFound(Uuid),

    #[error("group challenges require premium")]
    PremiumRequired,

    #[error("group challenge needs a name")]
    MissingName,
}

pub(crate) fn validate(target: u64, duration_days: u32) -> Result<(), ChallengeError> {
    if target == 0 {
        return Err(ChallengeError::InvalidTarget);
    }
    if !(1..=MAX_DURATION_DAYS).contains(&duration_days) {
        return Err(ChallengeError::InvalidDuration(duration_days));
    }
    Ok(())
}

/// Accumulates one metric from the creation moment onward
///
/// Activity already on the books when the challenge was created is recorded
/// as a baseline for that day and subtracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTracker {
    pub start_day: NaiveDate,
    pub tracked_day: NaiveDate,
    /// Today's value at creation, only on `start_day`
    #[serde(default)]
    pub baseline: u64,
    /// High-water value of `tracked_day` after the baseline
    #[serde(default)]
    pub day_value: u64,
    /// Sum over days before `tracked_day`
    #[serde(default)]
    pub closed_total: u64,
    /// Best day before `tracked_day`
    #[serde(default)]
    pub best_closed_day: u64,
}

impl MetricTracker {
    pub fn new(kind: ChallengeKind, day: NaiveDate, today: &DailyActivity) -> Self {
        Self {
            start_day: day,
            tracked_day: day,
            baseline: kind.daily_value(today),
            day_value: 0,
            closed_total: 0,
            best_closed_day: 0,
        }
    }

    /// Fold today's values in and return the metric's value since creation
    pub fn observe(&mut self, kind: ChallengeKind, day: NaiveDate, today: &DailyActivity, streak: u32) -> u64 {
        if day > self.tracked_day {
            self.closed_total += self.day_value;
            self.best_closed_day = self.best_closed_day.max(self.day_value);
            self.day_value = 0;
            self.baseline = 0;
            self.tracked_day = day;
        }

        if day == self.tracked_day {
            let value = kind.daily_value(today).saturating_sub(self.baseline);
            self.day_value = self.day_value.max(value);
        }

        match kind.aggregation() {
            Aggregation::BestDay => self.best_closed_day.max(self.day_value),
            Aggregation::Cumulative => self.closed_total + self.day_value,
            Aggregation::Streak => {
                let days_since_start = (self.tracked_day - self.start_day).num_days().max(0) as u64;
                u64::from(streak).min(days_since_start + 1)
            }
        }
    }
}
