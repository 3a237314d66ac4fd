//! What observers receive: the consolidated delta and read-only snapshots

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::achievements::{AchievementId, AchievementView};
use super::levels::{PlayerProfile, Rank};
use super::pets::{AccessoryId, EvolutionStage, Pet, PetMood};
use super::quests::DailyQuest;
use super::state::ProgressionState;

/// Source of XP not covered by its own event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XpSource {
    Steps,
    StepTier,
    DailyGoal,
    Streak,
}

impl XpSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            XpSource::Steps => "steps",
            XpSource::StepTier => "step tier",
            XpSource::DailyGoal => "daily goal",
            XpSource::Streak => "streak",
        }
    }
}

/// A single observable change, in the order it happened within a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressionEvent {
    XpAwarded { amount: u64, source: XpSource },
    LevelReached { level: u32 },
    RankChanged { from: Rank, to: Rank },
    AchievementUnlocked { id: AchievementId, xp: u64, retroactive: bool },
    AchievementAwaitingPremium { id: AchievementId },
    StreakExtended { days: u32 },
    StreakBroken { was: u32 },
    StreakMilestone { days: u32 },
    QuestsGenerated { day: NaiveDate },
    QuestCompleted { id: String, xp: u64 },
    QuestExpired { id: String },
    ChallengeCompleted { id: Uuid, xp: u64 },
    ChallengeExpired { id: Uuid },
    GroupGoalReached { id: Uuid },
    PetEvolved { pet_id: Uuid, stage: EvolutionStage },
    AccessoryUnlocked { pet_id: Uuid, accessory: AccessoryId },
}

impl fmt::Display for ProgressionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressionEvent::XpAwarded { amount, source } => {
                write!(f, "+{amount} XP ({})", source.as_str())
            }
            ProgressionEvent::LevelReached { level } => write!(f, "Reached level {level}"),
            ProgressionEvent::RankChanged { from, to } => write!(f, "Rank up: {} -> {}", from.title(), to.title()),
            ProgressionEvent::AchievementUnlocked { id, xp, retroactive } => {
                if *retroactive {
                    write!(f, "Achievement unlocked: {id} (+{xp} XP, earned earlier)")
                } else {
                    write!(f, "Achievement unlocked: {id} (+{xp} XP)")
                }
            }
            ProgressionEvent::AchievementAwaitingPremium { id } => {
                write!(f, "Achievement {id} earned, unlocks with premium")
            }
            ProgressionEvent::StreakExtended { days } => write!(f, "Streak: {days} days"),
            ProgressionEvent::StreakBroken { was } => write!(f, "Streak of {was} days ended"),
            ProgressionEvent::StreakMilestone { days } => write!(f, "Streak milestone: {days} days"),
            ProgressionEvent::QuestsGenerated { day } => write!(f, "New quests for {day}"),
            ProgressionEvent::QuestCompleted { id, xp } => write!(f, "Quest completed: {id} (+{xp} XP)"),
            ProgressionEvent::QuestExpired { id } => write!(f, "Quest expired: {id}"),
            ProgressionEvent::ChallengeCompleted { id, xp } => {
                write!(f, "Challenge completed: {id} (+{xp} XP)")
            }
            ProgressionEvent::ChallengeExpired { id } => write!(f, "Challenge expired: {id}"),
            ProgressionEvent::GroupGoalReached { id } => write!(f, "Group goal reached: {id}"),
            ProgressionEvent::PetEvolved { stage, .. } => write!(f, "Pet evolved to {stage}"),
            ProgressionEvent::AccessoryUnlocked { accessory, .. } => {
                write!(f, "Accessory unlocked: {accessory}")
            }
        }
    }
}

/// A consistent, fully committed view of all progression state
#[derive(Debug, Clone)]
pub struct ProgressionSnapshot {
    /// Commit generation this snapshot was taken at
    pub generation: u64,
    pub profile: PlayerProfile,
    pub state: ProgressionState,
    pub step_goal: u64,
}

impl ProgressionSnapshot {
    pub fn new(generation: u64, state: ProgressionState, step_goal: u64) -> Self {
        Self {
            generation,
            profile: PlayerProfile::from(&state.profile.xp),
            state,
            step_goal,
        }
    }

    pub fn premium(&self) -> bool {
        self.state.profile.last_premium
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.state.profile.last_processed_day
    }

    pub fn streak(&self) -> u32 {
        self.state.streak.current
    }

    pub fn today_steps(&self) -> u64 {
        match (self.state.profile.activity.day, self.day()) {
            (Some(tracked), Some(day)) if tracked == day => self.state.profile.activity.today.steps,
            _ => 0,
        }
    }

    pub fn quests(&self) -> &[DailyQuest] {
        &self.state.quests.quests
    }

    pub fn achievements(&self) -> Vec<AchievementView> {
        self.state.achievements.views()
    }

    pub fn active_pet(&self) -> Option<&Pet> {
        self.state.pets.active_pet()
    }

    pub fn pet_mood(&self, now: DateTime<Utc>) -> Option<PetMood> {
        self.active_pet().map(|pet| pet.mood(self.today_steps(), now))
    }
}

/// Everything one processed activity signal changed
///
/// Published once per signal, even when nothing changed.
#[derive(Debug, Clone)]
pub struct ProgressionDelta {
    pub xp_awarded: u64,
    pub new_level: Option<u32>,
    /// Every level reached this cycle, ascending
    pub levels_crossed: Vec<u32>,
    pub new_rank: Option<Rank>,
    pub unlocked_achievement_ids: Vec<AchievementId>,
    pub completed_quest_ids: Vec<String>,
    pub expired_quest_ids: Vec<String>,
    pub completed_challenge_ids: Vec<Uuid>,
    pub expired_challenge_ids: Vec<Uuid>,
    pub new_streak: u32,
    pub new_pet_stage: Option<EvolutionStage>,
    pub unlocked_accessories: Vec<AccessoryId>,
    pub events: Vec<ProgressionEvent>,
    pub snapshot: Arc<ProgressionSnapshot>,
}

impl ProgressionDelta {
    /// Nothing was awarded or unlocked
    pub fn is_quiet(&self) -> bool {
        self.xp_awarded == 0
            && self.unlocked_achievement_ids.is_empty()
            && self.completed_quest_ids.is_empty()
            && self.completed_challenge_ids.is_empty()
            && self.new_pet_stage.is_none()
    }
}
