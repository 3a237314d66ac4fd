//! Settings configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lowest daily step goal a user can configure
pub const MIN_STEP_GOAL: u64 = 1_000;
/// Highest daily step goal a user can configure
pub const MAX_STEP_GOAL: u64 = 50_000;

/// Progression rules that are user or product tunable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Steps needed for a day to count toward the streak
    #[serde(default = "default_daily_step_goal")]
    pub daily_step_goal: u64,

    /// Percentage of every XP award fed to the active pet
    #[serde(default = "default_pet_feed_percent")]
    pub pet_feed_percent: u64,

    /// Bonus XP paid every seventh consecutive goal day
    #[serde(default = "default_weekly_streak_bonus_xp")]
    pub weekly_streak_bonus_xp: u64,
}

impl EngineSettings {
    /// Step goal clamped to the supported range
    pub fn step_goal(&self) -> u64 {
        self.daily_step_goal.clamp(MIN_STEP_GOAL, MAX_STEP_GOAL)
    }

    /// Pet share of the XP earned while the total moved from `total_before`
    /// to `total_after`
    ///
    /// Measured against the running total so fractions carry over between
    /// awards instead of being dropped each time.
    pub fn pet_share(&self, total_before: u64, total_after: u64) -> u64 {
        self.share_of(total_after).saturating_sub(self.share_of(total_before))
    }

    fn share_of(&self, total_xp: u64) -> u64 {
        (u128::from(total_xp) * u128::from(self.pet_feed_percent.min(100)) / 100) as u64
    }
}

fn default_daily_step_goal() -> u64 {
    10_000
}

fn default_pet_feed_percent() -> u64 {
    50
}

fn default_weekly_streak_bonus_xp() -> u64 {
    150
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            daily_step_goal: default_daily_step_goal(),
            pet_feed_percent: default_pet_feed_percent(),
            weekly_streak_bonus_xp: default_weekly_streak_bonus_xp(),
        }
    }
}

/// Where and how entity blobs are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database path (defaults to ~/.stepquest/progress.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Write attempts per coordinator cycle before giving up until the next one
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,

    /// Upper bound on a single write attempt
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl StorageSettings {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms.max(1))
    }
}

fn default_write_attempts() -> u32 {
    3
}

fn default_write_timeout_ms() -> u64 {
    2_000
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            write_attempts: default_write_attempts(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

/// Coordinator channel sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    /// Pending commands before senders wait
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Deltas retained for slow subscribers
    #[serde(default = "default_delta_buffer")]
    pub delta_buffer: usize,

    /// Upper bound on an entitlement lookup before the last known status is used
    #[serde(default = "default_entitlement_timeout_ms")]
    pub entitlement_timeout_ms: u64,
}

impl CoordinatorSettings {
    pub fn entitlement_timeout(&self) -> Duration {
        Duration::from_millis(self.entitlement_timeout_ms.max(1))
    }
}

fn default_queue_capacity() -> usize {
    64
}

fn default_delta_buffer() -> usize {
    32
}

fn default_entitlement_timeout_ms() -> u64 {
    1_500
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            delta_buffer: default_delta_buffer(),
            entitlement_timeout_ms: default_entitlement_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_goal_is_clamped() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.step_goal(), 10_000);

        settings.daily_step_goal = 10;
        assert_eq!(settings.step_goal(), MIN_STEP_GOAL);

        settings.daily_step_goal = 1_000_000;
        assert_eq!(settings.step_goal(), MAX_STEP_GOAL);
    }

    #[test]
    fn test_pet_share_carries_fractions() {
        let settings = EngineSettings::default();
        let fed: u64 = (0..200).map(|total| settings.pet_share(total, total + 1)).sum();
        assert_eq!(fed, 100);
    }

    #[test]
    fn test_pet_share() {
        let mut settings = EngineSettings::default();
        assert_eq!(settings.pet_share(0, 101), 50);
        assert_eq!(settings.pet_share(101, 102), 1);

        settings.pet_feed_percent = 250;
        assert_eq!(settings.pet_share(0, 40), 40);
        assert_eq!(settings.pet_share(0, u64::MAX), u64::MAX);
    }
}
