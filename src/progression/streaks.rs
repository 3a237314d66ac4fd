//! Goal-day streak tracking
//!
//! A day is credited with whether the step goal was reached. The first credit
//! of a day decides continuation from the previous credited day; a later
//! credit on the same day can only upgrade a miss to a reach.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rewards::XpRewards;
use crate::clock::days_between;

/// Consecutive goal-day counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current: u32,
    pub best: u32,
    pub last_credited_day: Option<NaiveDate>,
    /// Whether `last_credited_day` reached the goal
    #[serde(default)]
    pub last_day_reached: bool,
    /// Streak carried into `last_credited_day` from the day before it
    #[serde(default)]
    pub carried_in: u32,
    /// One-time milestone bonuses already paid
    #[serde(default)]
    pub claimed_milestones: Vec<u32>,
}

/// Outcome of crediting a day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakCredit {
    /// Streak grew (a new consecutive goal day)
    pub extended: bool,
    /// A running streak dropped to zero
    pub broken: bool,
    /// Milestones reached by this credit
    pub milestones: Vec<u32>,
    pub bonus_xp: u64,
}

impl StreakRecord {
    /// Credit `today` with whether its goal was reached
    ///
    /// Days before the last credited day are ignored. `weekly_bonus_xp` is
    /// paid whenever the streak lands on a multiple of seven.
    pub fn credit_day(&mut self, reached: bool, today: NaiveDate, weekly_bonus_xp: u64) -> StreakCredit {
        let mut credit = StreakCredit::default();

        match self.last_credited_day {
            Some(last) if today < last => return credit,
            Some(last) if today == last => {
                if !reached || self.last_day_reached {
                    return credit;
                }
                self.last_day_reached = true;
                self.current = self.carried_in + 1;
                credit.extended = true;
            }
            last => {
                let gap = last.map(|l| days_between(l, today));
                self.carried_in = if gap == Some(1) { self.current } else { 0 };
                self.last_credited_day = Some(today);
                self.last_day_reached = reached;

                if reached {
                    self.current = self.carried_in + 1;
                    credit.extended = true;
                } else {
                    credit.broken = self.current > 0;
                    self.current = 0;
                }
            }
        }

        if credit.extended {
            self.best = self.best.max(self.current);
            if self.current % 7 == 0 {
                credit.bonus_xp += weekly_bonus_xp;
            }
            for &(days, xp) in XpRewards::STREAK_MILESTONES {
                if self.current >= days && !self.claimed_milestones.contains(&days) {
                    self.claimed_milestones.push(days);
                    credit.milestones.push(days);
                    credit.bonus_xp += xp;
                }
            }
        }

        credit
    }

    /// Whether the streak is still alive on `today` (credited today or yesterday)
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.current > 0
            && self
                .last_credited_day
                .is_some_and(|last| (0..=1).contains(&days_between(last, today)))
    }
}
