//! Quest Scheduler
//!
//! A fixed set of daily quests drawn from a template catalog. Each slot is
//! drawn with its own RNG seeded from the day, the slot index, and how often
//! the slot was rerolled, so refreshing one slot never disturbs the others
//! and regenerating a day always yields the same set.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::activity::DailyActivity;

/// Quests offered per day
pub const QUEST_SLOTS: u8 = 3;

/// Slot drawn from the premium pool
pub const PREMIUM_SLOT: u8 = 2;

/// Measured quantity a quest tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Steps,
    /// Meters
    Distance,
    Calories,
    ActiveMinutes,
}

impl QuestKind {
    pub fn value(&self, today: &DailyActivity) -> u64 {
        match self {
            QuestKind::Steps => today.steps,
            QuestKind::Distance => today.distance_meters as u64,
            QuestKind::Calories => today.calories as u64,
            QuestKind::ActiveMinutes => today.active_minutes,
        }
    }
}

/// Catalog entry a daily quest is instantiated from
#[derive(Debug, Clone)]
pub struct QuestTemplate {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: QuestKind,
    pub requirement: u64,
    pub xp_reward: u64,
    pub is_premium: bool,
}

macro_rules! quest {
    ($id:literal, $title:literal, $kind:ident, $req:expr, $xp:expr, $premium:expr) => {
        QuestTemplate {
            id: $id,
            title: $title,
            kind: QuestKind::$kind,
            requirement: $req,
            xp_reward: $xp,
            is_premium: $premium,
        }
    };
}

/// All quest templates
pub static QUEST_TEMPLATES: &[QuestTemplate] = &[
    quest!("steps_5k", "Walk 5,000 steps", Steps, 5_000, 50, false),
    quest!("steps_8k", "Walk 8,000 steps", Steps, 8_000, 80, false),
    quest!("steps_10k", "Walk 10,000 steps", Steps, 10_000, 100, false),
    quest!("steps_12k", "Walk 12,000 steps", Steps, 12_000, 120, false),
    quest!("distance_3km", "Cover 3 km", Distance, 3_000, 60, false),
    quest!("distance_5km", "Cover 5 km", Distance, 5_000, 100, false),
    quest!("calories_200", "Burn 200 kcal", Calories, 200, 50, false),
    quest!("calories_400", "Burn 400 kcal", Calories, 400, 100, false),
    quest!("active_30min", "Stay active for 30 minutes", ActiveMinutes, 30, 60, false),
    quest!("active_60min", "Stay active for an hour", ActiveMinutes, 60, 120, false),
    // Premium pool
    quest!("steps_15k", "Walk 15,000 steps", Steps, 15_000, 200, true),
    quest!("steps_20k", "Walk 20,000 steps", Steps, 20_000, 300, true),
    quest!("distance_10km", "Cover 10 km", Distance, 10_000, 250, true),
    quest!("calories_600", "Burn 600 kcal", Calories, 600, 200, true),
    quest!("active_90min", "Stay active for 90 minutes", ActiveMinutes, 90, 220, true),
];

impl QuestTemplate {
    pub fn get(id: &str) -> Option<&'static QuestTemplate> {
        QUEST_TEMPLATES.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum QuestStatus {
    Active,
    Completed { at: DateTime<Utc> },
}

/// A quest instance for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyQuest {
    pub id: String,
    pub template_id: String,
    pub slot: u8,
    pub title: String,
    pub kind: QuestKind,
    pub requirement: u64,
    /// Capped at `requirement`
    pub progress: u64,
    pub xp_reward: u64,
    pub is_premium: bool,
    pub generated_day: NaiveDate,
    /// Times this slot was refreshed today
    #[serde(default)]
    pub rerolls: u32,
    pub status: QuestStatus,
}

impl DailyQuest {
    fn from_template(template: &QuestTemplate, day: NaiveDate, slot: u8, rerolls: u32) -> Self {
        Self {
            id: format!("{day}:{slot}:{rerolls}:{}", template.id),
            template_id: template.id.to_string(),
            slot,
            title: template.title.to_string(),
            kind: template.kind,
            requirement: template.requirement,
            progress: 0,
            xp_reward: template.xp_reward,
            is_premium: template.is_premium,
            generated_day: day,
            rerolls,
            status: QuestStatus::Active,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, QuestStatus::Completed { .. })
    }

    /// Completion ratio (0.0 - 1.0)
    pub fn progress_ratio(&self) -> f64 {
        if self.requirement == 0 {
            return 1.0;
        }
        (self.progress as f64 / self.requirement as f64).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestError {
    #[error("quest not found: {0}")]
    NotFound(String),

    #[error("quest already completed: {0}")]
    AlreadyCompleted(String),

    #[error("no other quest template available for slot {0}")]
    NoAlternative(u8),
}

/// The current day's quest set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestBoard {
    #[serde(default)]
    pub day: Option<NaiveDate>,
    #[serde(default)]
    pub quests: Vec<DailyQuest>,
}

/// Outcome of moving the board to a new day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestRollover {
    pub day: NaiveDate,
    /// Unfinished quests from the previous set, discarded without reward
    pub expired: Vec<DailyQuest>,
}

impl QuestBoard {
    /// Replace the set when `today` is a later day than the board's
    pub fn roll_over(&mut self, today: NaiveDate) -> Option<QuestRollover> {
        if self.day.is_some_and(|day| day >= today) {
            return None;
        }

        let expired = self
            .quests
            .drain(..)
            .filter(|q| !q.is_completed())
            .collect();
        self.quests = generate(today);
        self.day = Some(today);

        info!(
            day = %today,
            quests = ?self.quests.iter().map(|q| q.template_id.as_str()).collect::<Vec<_>>(),
            "Generated daily quests"
        );

        Some(QuestRollover { day: today, expired })
    }

    /// Progress active quests from today's activity, returning the newly completed
    ///
    /// Premium quests stand still while premium is inactive.
    pub fn advance(&mut self, today: &DailyActivity, premium: bool, now: DateTime<Utc>) -> Vec<DailyQuest> {
        let mut completed = Vec::new();
        for quest in self.quests.iter_mut() {
            if quest.is_completed() || (quest.is_premium && !premium) {
                continue;
            }

            let value = quest.kind.value(today).min(quest.requirement);
            quest.progress = quest.progress.max(value);

            if quest.progress >= quest.requirement {
                quest.status = QuestStatus::Completed { at: now };
                completed.push(quest.clone());
            }
        }
        completed
    }

    /// Swap one unfinished quest for a different template
    pub fn refresh(&mut self, quest_id: &str) -> Result<DailyQuest, QuestError> {
        let index = self
            .quests
            .iter()
            .position(|q| q.id == quest_id)
            .ok_or_else(|| QuestError::NotFound(quest_id.to_string()))?;

        let current = &self.quests[index];
        if current.is_completed() {
            return Err(QuestError::AlreadyCompleted(quest_id.to_string()));
        }

        let exclude: Vec<&str> = self.quests.iter().map(|q| q.template_id.as_str()).collect();
        let rerolls = current.rerolls + 1;
        let template = pick_template(current.generated_day, current.slot, rerolls, &exclude)
            .ok_or(QuestError::NoAlternative(current.slot))?;

        let replacement = DailyQuest::from_template(template, current.generated_day, current.slot, rerolls);
        self.quests[index] = replacement.clone();
        Ok(replacement)
    }

    pub fn get(&self, quest_id: &str) -> Option<&DailyQuest> {
        self.quests.iter().find(|q| q.id == quest_id)
    }

    pub fn completed_count(&self) -> usize {
        self.quests.iter().filter(|q| q.is_completed()).count()
    }
}

/// The full quest set for `day`
pub fn generate(day: NaiveDate) -> Vec<DailyQuest> {
    let mut quests: Vec<DailyQuest> = Vec::with_capacity(QUEST_SLOTS as usize);
    for slot in 0..QUEST_SLOTS {
        let exclude: Vec<&str> = quests.iter().map(|q| q.template_id.as_str()).collect();
        if let Some(template) = pick_template(day, slot, 0, &exclude) {
            quests.push(DailyQuest::from_template(template, day, slot, 0));
        }
    }
    quests
}

fn pick_template(day: NaiveDate, slot: u8, rerolls: u32, exclude: &[&str]) -> Option<&'static QuestTemplate> {
    let premium_slot = slot == PREMIUM_SLOT;
    let pool: Vec<&'static QuestTemplate> = QUEST_TEMPLATES
        .iter()
        .filter(|t| t.is_premium == premium_slot && !exclude.contains(&t.id))
        .collect();

    let mut rng = ChaCha20Rng::seed_from_u64(slot_seed(day, slot, rerolls));
    pool.choose(&mut rng).copied()
}

fn slot_seed(day: NaiveDate, slot: u8, rerolls: u32) -> u64 {
    let day_index = day.num_days_from_ce() as u64;
    day_index.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (u64::from(slot) << 40) ^ u64::from(rerolls)
}
