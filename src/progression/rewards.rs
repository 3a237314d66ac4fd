//! XP paid directly for activity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::activity::ActivityReading;

/// XP rewards for various actions
pub struct XpRewards;

impl XpRewards {
    /// Lifetime steps per XP point
    pub const STEPS_PER_XP: u64 = 100;

    /// Reaching the daily step goal
    pub const DAILY_GOAL: u64 = 50;

    /// (steps in a day, bonus XP), each paid once per day
    pub const STEP_TIERS: &'static [(u64, u64)] = &[(10_000, 20), (15_000, 30), (20_000, 50)];

    /// (streak length, bonus XP), each paid once ever
    pub const STREAK_MILESTONES: &'static [(u32, u64)] = &[(7, 1_000), (30, 5_000), (100, 20_000)];
}

/// What a cycle earned from raw activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityXp {
    pub step_xp: u64,
    pub tier_xp: u64,
    /// Step tiers newly reached today
    pub tiers_reached: Vec<u64>,
    pub goal_bonus_xp: u64,
}

impl ActivityXp {
    pub fn total(&self) -> u64 {
        self.step_xp + self.tier_xp + self.goal_bonus_xp
    }
}

/// Watermarks that keep activity XP from being paid twice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRewards {
    /// Lifetime steps already converted into XP
    #[serde(default)]
    pub credited_lifetime_steps: Option<u64>,
    #[serde(default)]
    pub bonus_day: Option<NaiveDate>,
    #[serde(default)]
    pub claimed_tiers: Vec<u64>,
    #[serde(default)]
    pub goal_bonus_claimed: bool,
}

impl ActivityRewards {
    /// Pay XP for activity not yet credited
    ///
    /// The first reading ever seen only credits today's steps; history from
    /// before install is not back-paid.
    pub fn credit(&mut self, reading: &ActivityReading, step_goal: u64) -> ActivityXp {
        let mut earned = ActivityXp::default();

        let credited = *self
            .credited_lifetime_steps
            .get_or_insert_with(|| reading.lifetime_steps.saturating_sub(reading.today.steps));
        if reading.lifetime_steps > credited {
            earned.step_xp = reading.lifetime_steps / XpRewards::STEPS_PER_XP
                - credited / XpRewards::STEPS_PER_XP;
            self.credited_lifetime_steps = Some(reading.lifetime_steps);
        }

        if self.bonus_day != Some(reading.day) {
            self.bonus_day = Some(reading.day);
            self.claimed_tiers.clear();
            self.goal_bonus_claimed = false;
        }

        for &(threshold, xp) in XpRewards::STEP_TIERS {
            if reading.today.steps >= threshold && !self.claimed_tiers.contains(&threshold) {
                self.claimed_tiers.push(threshold);
                earned.tiers_reached.push(threshold);
                earned.tier_xp += xp;
            }
        }

        if reading.today.steps >= step_goal && !self.goal_bonus_claimed {
            self.goal_bonus_claimed = true;
            earned.goal_bonus_xp = XpRewards::DAILY_GOAL;
        }

        earned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::activity::{ActivityLedger, ActivitySnapshot};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn reading(ledger: &mut ActivityLedger, d: u32, today: i64, lifetime: i64) -> ActivityReading {
        ledger.absorb(&ActivitySnapshot::steps(day(d), today, lifetime), day(d), 10_000)
    }

    #[test]
    fn test_first_reading_does_not_back_pay_history() {
        let mut ledger = ActivityLedger::default();
        let mut rewards = ActivityRewards::default();
        let xp = rewards.credit(&reading(&mut ledger, 12, 3_000, 2_000_000), 10_000);
        assert_eq!(xp.step_xp, 30);
        assert_eq!(xp.total(), 30);
    }

    #[test]
    fn test_repeated_reading_pays_nothing() {
        let mut ledger = ActivityLedger::default();
        let mut rewards = ActivityRewards::default();
        let r = reading(&mut ledger, 12, 15_500, 15_500);
        let first = rewards.credit(&r, 10_000);
        assert_eq!(first.step_xp, 155);
        assert_eq!(first.tiers_reached, vec![10_000, 15_000]);
        assert_eq!(first.goal_bonus_xp, XpRewards::DAILY_GOAL);

        let second = rewards.credit(&r, 10_000);
        assert_eq!(second, ActivityXp::default());
    }

    #[test]
    fn test_partial_hundreds_carry_over() {
        let mut ledger = ActivityLedger::default();
        let mut rewards = ActivityRewards::default();
        assert_eq!(rewards.credit(&reading(&mut ledger, 12, 150, 150), 10_000).step_xp, 1);
        assert_eq!(rewards.credit(&reading(&mut ledger, 12, 199, 199), 10_000).step_xp, 0);
        assert_eq!(rewards.credit(&reading(&mut ledger, 12, 201, 201), 10_000).step_xp, 1);
    }

    #[test]
    fn test_tiers_reset_on_new_day() {
        let mut ledger = ActivityLedger::default();
        let mut rewards = ActivityRewards::default();
        let first = rewards.credit(&reading(&mut ledger, 12, 10_000, 10_000), 10_000);
        assert_eq!(first.tier_xp, 20);

        let next_day = rewards.credit(&reading(&mut ledger, 13, 10_000, 20_000), 10_000);
        assert_eq!(next_day.tier_xp, 20);
        assert_eq!(next_day.goal_bonus_xp, XpRewards::DAILY_GOAL);
        assert_eq!(next_day.step_xp, 100);
    }
}
