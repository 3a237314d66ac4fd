//! Metric extraction for achievement checks
//!
//! Turns one cycle's activity reading and streak into the plain counters the
//! catalog's metrics refer to.

use chrono::{Datelike, NaiveDate, Weekday};

use super::definitions::{Achievement, AchievementMetric, Season};
use crate::progression::activity::{ActivityReading, DailyActivity};
use crate::progression::streaks::StreakRecord;

/// Counters available to achievement metrics during one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSet {
    pub day: NaiveDate,
    pub today: DailyActivity,
    pub week: DailyActivity,
    pub month_steps: u64,
    pub lifetime_steps: u64,
    pub lifetime_distance_meters: f64,
    pub streak_days: u32,
    pub goal_days_this_week: u32,
    pub goal_reached_today: bool,
    /// Filled in by the engine while evaluating
    pub unlocked_count: u64,
}

impl MetricSet {
    pub fn new(reading: &ActivityReading, streak: &StreakRecord, step_goal: u64) -> Self {
        Self {
            day: reading.day,
            today: reading.today,
            week: reading.week,
            month_steps: reading.month_steps,
            lifetime_steps: reading.lifetime_steps,
            lifetime_distance_meters: reading.lifetime_distance_meters,
            streak_days: streak.current,
            goal_days_this_week: reading.goal_days_this_week,
            goal_reached_today: reading.today.steps >= step_goal,
            unlocked_count: 0,
        }
    }

    /// Current value of `metric`
    pub fn value(&self, metric: AchievementMetric) -> u64 {
        match metric {
            AchievementMetric::DailySteps => self.today.steps,
            AchievementMetric::WeekSteps => self.week.steps,
            AchievementMetric::MonthSteps => self.month_steps,
            AchievementMetric::LifetimeSteps => self.lifetime_steps,
            AchievementMetric::StreakDays => u64::from(self.streak_days),
            AchievementMetric::DailyDistance => self.today.distance_meters as u64,
            AchievementMetric::LifetimeDistance => self.lifetime_distance_meters as u64,
            AchievementMetric::DailyCalories => self.today.calories as u64,
            AchievementMetric::WeekCalories => self.week.calories as u64,
            AchievementMetric::WeekendSteps => match self.day.weekday() {
                Weekday::Sat | Weekday::Sun => self.today.steps,
                _ => 0,
            },
            AchievementMetric::MondaySteps => match self.day.weekday() {
                Weekday::Mon => self.today.steps,
                _ => 0,
            },
            AchievementMetric::GoalDaysThisWeek => u64::from(self.goal_days_this_week),
            AchievementMetric::SpecialDay { month, day } => u64::from(
                self.goal_reached_today && self.day.month() == month && self.day.day() == day,
            ),
            AchievementMetric::SeasonGoal(season) => {
                u64::from(self.goal_reached_today && Season::of_month(self.day.month()) == season)
            }
            AchievementMetric::UnlockedCount => self.unlocked_count,
        }
    }

    /// Whether `achievement`'s requirement is met right now
    pub fn meets(&self, achievement: &Achievement) -> bool {
        self.value(achievement.metric) >= achievement.requirement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::achievements::{AchievementId, ACHIEVEMENTS};
    use crate::progression::activity::{ActivityLedger, ActivitySnapshot};

    fn metrics_for(date: NaiveDate, steps: i64) -> MetricSet {
        let mut ledger = ActivityLedger::default();
        let reading = ledger.absorb(&ActivitySnapshot::steps(date, steps, steps), date, 10_000);
        MetricSet::new(&reading, &StreakRecord::default(), 10_000)
    }

    #[test]
    fn test_weekend_and_monday_metrics() {
        // 2026-10-17 is a Saturday, 2026-10-19 a Monday
        let saturday = metrics_for(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), 16_000);
        assert_eq!(saturday.value(AchievementMetric::WeekendSteps), 16_000);
        assert_eq!(saturday.value(AchievementMetric::MondaySteps), 0);

        let monday = metrics_for(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), 11_000);
        assert_eq!(monday.value(AchievementMetric::MondaySteps), 11_000);
        assert_eq!(monday.value(AchievementMetric::WeekendSteps), 0);
    }

    #[test]
    fn test_special_day_needs_goal() {
        let halloween = NaiveDate::from_ymd_opt(2026, 10, 31).unwrap();
        let lazy = metrics_for(halloween, 2_000);
        let metric = AchievementMetric::SpecialDay { month: 10, day: 31 };
        assert_eq!(lazy.value(metric), 0);

        let active = metrics_for(halloween, 10_500);
        assert_eq!(active.value(metric), 1);
        assert_eq!(active.value(AchievementMetric::SeasonGoal(Season::Autumn)), 1);
        assert_eq!(active.value(AchievementMetric::SeasonGoal(Season::Spring)), 0);
    }

    #[test]
    fn test_meets_daily_steps() {
        let metrics = metrics_for(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(), 10_000);
        let ids: Vec<AchievementId> = ACHIEVEMENTS
            .iter()
            .filter(|a| metrics.meets(a))
            .map(|a| a.id)
            .collect();
        assert!(ids.contains(&AchievementId::FirstSteps));
        assert!(ids.contains(&AchievementId::Step10k));
        assert!(!ids.contains(&AchievementId::Step15k));
        assert!(ids.contains(&AchievementId::AutumnLeaves));
    }
}
