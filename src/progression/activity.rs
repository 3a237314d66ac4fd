//! Activity signal intake
//!
//! The health source pushes [`ActivitySnapshot`]s whenever it refreshes. The
//! [`ActivityLedger`] cleans each snapshot against the last known good values,
//! keeps per-day high-water marks, and derives the totals every subsystem
//! reads during a cycle.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{month_start, week_start};

/// Upper bounds accepted from the health source for a single day
pub const MAX_DAILY_STEPS: i64 = 1_000_000;
pub const MAX_DAILY_DISTANCE_METERS: f64 = 500_000.0;
pub const MAX_DAILY_CALORIES: f64 = 10_000.0;
pub const MAX_DAILY_ACTIVE_MINUTES: i64 = 1_440;

/// Closed days retained for weekly and monthly sums
const RECENT_DAYS_KEPT: i64 = 40;

/// One reading from the health-data source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivitySnapshot {
    pub today_steps: i64,
    pub today_distance_meters: f64,
    pub today_calories: f64,
    pub today_active_minutes: i64,
    /// Monotonic all-time step counter
    pub lifetime_steps: i64,
    /// Local calendar day the daily fields belong to
    pub date: NaiveDate,
}

impl ActivitySnapshot {
    /// Snapshot carrying only step counts
    pub fn steps(date: NaiveDate, today_steps: i64, lifetime_steps: i64) -> Self {
        Self {
            today_steps,
            today_distance_meters: 0.0,
            today_calories: 0.0,
            today_active_minutes: 0,
            lifetime_steps,
            date,
        }
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.today_distance_meters = meters;
        self
    }

    pub fn with_calories(mut self, calories: f64) -> Self {
        self.today_calories = calories;
        self
    }

    pub fn with_active_minutes(mut self, minutes: i64) -> Self {
        self.today_active_minutes = minutes;
        self
    }
}

/// Entitlement state pulled from the subscription collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub is_premium_active: bool,
}

impl SubscriptionStatus {
    pub fn premium() -> Self {
        Self {
            is_premium_active: true,
        }
    }

    pub fn free() -> Self {
        Self::default()
    }
}

/// Cleaned daily values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub steps: u64,
    pub distance_meters: f64,
    pub calories: f64,
    pub active_minutes: u64,
}

impl DailyActivity {
    fn add(&mut self, other: &DailyActivity) {
        self.steps += other.steps;
        self.distance_meters += other.distance_meters;
        self.calories += other.calories;
        self.active_minutes += other.active_minutes;
    }
}

/// Everything a cycle knows about activity, derived from the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityReading {
    pub day: NaiveDate,
    pub today: DailyActivity,
    pub lifetime_steps: u64,
    pub lifetime_distance_meters: f64,
    pub lifetime_calories: f64,
    pub lifetime_active_minutes: u64,
    /// Sums for the ISO week containing `day`, today included
    pub week: DailyActivity,
    pub month_steps: u64,
    /// Days this week whose steps reached the goal
    pub goal_days_this_week: u32,
}

/// Persistent activity totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityLedger {
    /// Day `today` belongs to
    #[serde(default)]
    pub day: Option<NaiveDate>,
    /// High-water values for `day`
    #[serde(default)]
    pub today: DailyActivity,
    #[serde(default)]
    pub lifetime_steps: u64,
    /// Sums over closed days
    #[serde(default)]
    pub closed: DailyActivity,
    #[serde(default)]
    pub recent: BTreeMap<NaiveDate, DailyActivity>,
    /// Invalid fields replaced by their last known value
    #[serde(default)]
    pub rejected_fields: u64,
}

impl ActivityLedger {
    /// Fold a snapshot into the ledger for processing day `day`
    ///
    /// Daily fields from a snapshot dated before `day` are ignored, and so
    /// are those of a snapshot dated past it (a date the caller refused to
    /// advance to). The lifetime counter is still honoured. Invalid fields
    /// keep the last known good value, so their delta is zero.
    pub fn absorb(&mut self, signal: &ActivitySnapshot, day: NaiveDate, step_goal: u64) -> ActivityReading {
        self.roll_to(day);

        if signal.date < day {
            debug!(signal_date = %signal.date, day = %day, "Ignoring daily fields of a stale snapshot");
        } else if signal.date > day {
            self.rejected_fields += 1;
            warn!(signal_date = %signal.date, day = %day, "Snapshot dated past the processing day, keeping last known values");
        } else {
            let last = self.today;
            self.today = DailyActivity {
                steps: self.clean_count("today_steps", signal.today_steps, MAX_DAILY_STEPS, last.steps),
                distance_meters: self.clean_amount(
                    "today_distance_meters",
                    signal.today_distance_meters,
                    MAX_DAILY_DISTANCE_METERS,
                    last.distance_meters,
                ),
                calories: self.clean_amount(
                    "today_calories",
                    signal.today_calories,
                    MAX_DAILY_CALORIES,
                    last.calories,
                ),
                active_minutes: self.clean_count(
                    "today_active_minutes",
                    signal.today_active_minutes,
                    MAX_DAILY_ACTIVE_MINUTES,
                    last.active_minutes,
                ),
            };
        }

        if signal.lifetime_steps < 0 {
            self.reject("lifetime_steps", signal.lifetime_steps as f64);
        } else {
            self.lifetime_steps = self.lifetime_steps.max(signal.lifetime_steps as u64);
        }
        self.lifetime_steps = self.lifetime_steps.max(self.today.steps);

        self.reading(day, step_goal)
    }

    /// Totals as of `day` without absorbing anything new
    pub fn reading(&self, day: NaiveDate, step_goal: u64) -> ActivityReading {
        let today = if self.day == Some(day) {
            self.today
        } else {
            DailyActivity::default()
        };

        let week_from = week_start(day);
        let month_from = month_start(day);
        let mut week = today;
        let mut month_steps = today.steps;
        let mut goal_days_this_week = u32::from(today.steps >= step_goal);

        for (date, activity) in self.recent.range(month_from.min(week_from)..day) {
            if *date >= week_from {
                week.add(activity);
                if activity.steps >= step_goal {
                    goal_days_this_week += 1;
                }
            }
            if *date >= month_from {
                month_steps += activity.steps;
            }
        }

        let mut lifetime = self.closed;
        lifetime.add(&today);

        ActivityReading {
            day,
            today,
            lifetime_steps: self.lifetime_steps,
            lifetime_distance_meters: lifetime.distance_meters,
            lifetime_calories: lifetime.calories,
            lifetime_active_minutes: lifetime.active_minutes,
            week,
            month_steps,
            goal_days_this_week,
        }
    }

    /// Close the tracked day when `day` is later
    fn roll_to(&mut self, day: NaiveDate) {
        match self.day {
            None => self.day = Some(day),
            Some(current) if day > current => {
                self.closed.add(&self.today);
                self.recent.insert(current, self.today);
                self.today = DailyActivity::default();
                self.day = Some(day);

                let cutoff = day - Duration::days(RECENT_DAYS_KEPT);
                self.recent = self.recent.split_off(&cutoff);
            }
            Some(_) => {}
        }
    }

    fn clean_count(&mut self, field: &'static str, value: i64, max: i64, last: u64) -> u64 {
        if (0..=max).contains(&value) {
            (value as u64).max(last)
        } else {
            self.reject(field, value as f64);
            last
        }
    }

    fn clean_amount(&mut self, field: &'static str, value: f64, max: f64, last: f64) -> f64 {
        if value.is_finite() && (0.0..=max).contains(&value) {
            value.max(last)
        } else {
            self.reject(field, value);
            last
        }
    }

    fn reject(&mut self, field: &'static str, value: f64) {
        self.rejected_fields += 1;
        warn!(field, value, "Invalid activity field, keeping last known value");
    }
}
