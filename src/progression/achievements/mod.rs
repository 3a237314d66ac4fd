//! Achievement Engine
//!
//! Static catalog, metric extraction, and the per-definition unlock state machine.

mod checker;
mod definitions;
mod state;

pub use checker::MetricSet;
pub use definitions::{
    Achievement, AchievementCategory, AchievementId, AchievementMetric, Rarity, Season,
    ACHIEVEMENTS,
};
pub use state::{
    AchievementBook, AchievementOutcome, AchievementState, AchievementStatus, AchievementView,
    Unlock, UnlockedAchievement,
};
