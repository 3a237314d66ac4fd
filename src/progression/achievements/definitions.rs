//! Achievement definitions and metadata
//!
//! All achievements are defined here with their metric, requirement, and reward.

/// Unique identifier for each achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AchievementId {
    // Daily and total steps
    FirstSteps,
    Step5k,
    Step10k,
    Step15k,
    Step20k,
    Step25k,
    Step30k,
    Step50k,
    Step100k,
    StepWeek100k,
    StepMonth500k,
    StepMillion,

    // Streaks
    Streak3,
    Streak7,
    Streak14,
    Streak30,
    Streak50,
    Streak100,
    Streak200,
    Streak365,
    Streak500,

    // Distance
    Distance10Km,
    Distance25Km,
    Distance50Km,
    Distance75Km,
    Distance100Km,
    Distance200Km,
    DistanceMoon,

    // Calories
    Calories1000,
    Calories2500,
    Calories5000,
    Calories10000,
    Calories15000,

    // Day of week
    WeekendWarrior,
    MondayMotivation,

    // Special
    PerfectWeek,
    MarathonRunner,
    NewYearWalker,
    ValentineSteps,
    HalloweenWalk,
    ChristmasWalk,
    NewYearChallenge,
    SpringBloom,
    SummerSun,
    AutumnLeaves,
    WinterFrost,
    AchievementCollector,
}

impl AchievementId {
    /// Stable string ID used in storage and events
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstSteps => "first_steps",
            Self::Step5k => "step_5k",
            Self::Step10k => "step_10k",
            Self::Step15k => "step_15k",
            Self::Step20k => "step_20k",
            Self::Step25k => "step_25k",
            Self::Step30k => "step_30k",
            Self::Step50k => "step_50k",
            Self::Step100k => "step_100k",
            Self::StepWeek100k => "step_week_100k",
            Self::StepMonth500k => "step_month_500k",
            Self::StepMillion => "step_million",
            Self::Streak3 => "streak_3",
            Self::Streak7 => "streak_7",
            Self::Streak14 => "streak_14",
            Self::Streak30 => "streak_30",
            Self::Streak50 => "streak_50",
            Self::Streak100 => "streak_100",
            Self::Streak200 => "streak_200",
            Self::Streak365 => "streak_365",
            Self::Streak500 => "streak_500",
            Self::Distance10Km => "distance_10km",
            Self::Distance25Km => "distance_25km",
            Self::Distance50Km => "distance_50km",
            Self::Distance75Km => "distance_75km",
            Self::Distance100Km => "distance_100km",
            Self::Distance200Km => "distance_200km",
            Self::DistanceMoon => "distance_moon",
            Self::Calories1000 => "calories_1000",
            Self::Calories2500 => "calories_2500",
            Self::Calories5000 => "calories_5000",
            Self::Calories10000 => "calories_10000",
            Self::Calories15000 => "calories_15000",
            Self::WeekendWarrior => "weekend_warrior",
            Self::MondayMotivation => "monday_motivation",
            Self::PerfectWeek => "perfect_week",
            Self::MarathonRunner => "marathon_runner",
            Self::NewYearWalker => "new_year_walker",
            Self::ValentineSteps => "valentine_steps",
            Self::HalloweenWalk => "halloween_walk",
            Self::ChristmasWalk => "christmas_walk",
            Self::NewYearChallenge => "new_year_challenge",
            Self::SpringBloom => "spring_bloom",
            Self::SummerSun => "summer_sun",
            Self::AutumnLeaves => "autumn_leaves",
            Self::WinterFrost => "winter_frost",
            Self::AchievementCollector => "achievement_collector",
        }
    }

    /// Parse from the stable string ID
    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    /// Get all achievement IDs in catalog order
    pub fn all() -> &'static [AchievementId] {
        &[
            Self::FirstSteps,
            Self::Step5k,
            Self::Step10k,
            Self::Step15k,
            Self::Step20k,
            Self::Step25k,
            Self::Step30k,
            Self::Step50k,
            Self::Step100k,
            Self::StepWeek100k,
            Self::StepMonth500k,
            Self::StepMillion,
            Self::Streak3,
            Self::Streak7,
            Self::Streak14,
            Self::Streak30,
            Self::Streak50,
            Self::Streak100,
            Self::Streak200,
            Self::Streak365,
            Self::Streak500,
            Self::Distance10Km,
            Self::Distance25Km,
            Self::Distance50Km,
            Self::Distance75Km,
            Self::Distance100Km,
            Self::Distance200Km,
            Self::DistanceMoon,
            Self::Calories1000,
            Self::Calories2500,
            Self::Calories5000,
            Self::Calories10000,
            Self::Calories15000,
            Self::WeekendWarrior,
            Self::MondayMotivation,
            Self::PerfectWeek,
            Self::MarathonRunner,
            Self::NewYearWalker,
            Self::ValentineSteps,
            Self::HalloweenWalk,
            Self::ChristmasWalk,
            Self::NewYearChallenge,
            Self::SpringBloom,
            Self::SummerSun,
            Self::AutumnLeaves,
            Self::WinterFrost,
            Self::AchievementCollector,
        ]
    }
}

impl std::fmt::Display for AchievementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Achievement category for grouping in UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementCategory {
    Steps,
    Streak,
    Distance,
    Calories,
    Time,
    Special,
}

impl AchievementCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Steps => "Steps",
            Self::Streak => "Streaks",
            Self::Distance => "Journeys",
            Self::Calories => "Calories",
            Self::Time => "Time",
            Self::Special => "Special",
        }
    }
}

/// Rarity tier, which decides the unlock bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn xp_bonus(&self) -> u64 {
        match self {
            Self::Common => 50,
            Self::Rare => 150,
            Self::Epic => 500,
            Self::Legendary => 2_000,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
        }
    }
}

/// Northern-hemisphere meteorological seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn of_month(month: u32) -> Season {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// Measured quantity an achievement tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementMetric {
    DailySteps,
    WeekSteps,
    MonthSteps,
    LifetimeSteps,
    /// Current goal streak in days
    StreakDays,
    /// Meters
    DailyDistance,
    /// Meters
    LifetimeDistance,
    DailyCalories,
    WeekCalories,
    /// Today's steps when today is Saturday or Sunday
    WeekendSteps,
    /// Today's steps when today is Monday
    MondaySteps,
    GoalDaysThisWeek,
    /// 1 once the goal is reached on this calendar date
    SpecialDay { month: u32, day: u32 },
    /// 1 once the goal is reached during this season
    SeasonGoal(Season),
    /// Other achievements unlocked
    UnlockedCount,
}

/// Achievement definition with all metadata
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub metric: AchievementMetric,
    /// Progress value at which the achievement is earned
    pub requirement: u64,
    /// Unlock and bonus wait for an active subscription
    pub is_premium: bool,
}

/// All achievement definitions
pub static ACHIEVEMENTS: &[Achievement] = &[
    // === STEPS ===
    Achievement {
        id: AchievementId::FirstSteps,
        name: "First Steps",
        description: "Walk 1,000 steps in a day",
        icon: "👟",
        category: AchievementCategory::Steps,
        rarity: Rarity::Common,
        metric: AchievementMetric::DailySteps,
        requirement: 1000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step5k,
        name: "Active Day",
        description: "Walk 5,000 steps in a day",
        icon: "🚶",
        category: AchievementCategory::Steps,
        rarity: Rarity::Common,
        metric: AchievementMetric::DailySteps,
        requirement: 5000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step10k,
        name: "True Walker",
        description: "Walk 10,000 steps in a day",
        icon: "🏃",
        category: AchievementCategory::Steps,
        rarity: Rarity::Rare,
        metric: AchievementMetric::DailySteps,
        requirement: 10_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step15k,
        name: "Tireless",
        description: "Walk 15,000 steps in a day",
        icon: "💨",
        category: AchievementCategory::Steps,
        rarity: Rarity::Epic,
        metric: AchievementMetric::DailySteps,
        requirement: 15_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step20k,
        name: "Marathoner",
        description: "Walk 20,000 steps in a day",
        icon: "🏅",
        category: AchievementCategory::Steps,
        rarity: Rarity::Epic,
        metric: AchievementMetric::DailySteps,
        requirement: 20_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step25k,
        name: "Super Walker",
        description: "Walk 25,000 steps in a day",
        icon: "⚡",
        category: AchievementCategory::Steps,
        rarity: Rarity::Epic,
        metric: AchievementMetric::DailySteps,
        requirement: 25_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step30k,
        name: "Ultra Walker",
        description: "Walk 30,000 steps in a day",
        icon: "🔋",
        category: AchievementCategory::Steps,
        rarity: Rarity::Epic,
        metric: AchievementMetric::DailySteps,
        requirement: 30_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step50k,
        name: "Ultramarathon",
        description: "Walk 50,000 steps in a day",
        icon: "🦸",
        category: AchievementCategory::Steps,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::DailySteps,
        requirement: 50_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Step100k,
        name: "100K Master",
        description: "Walk 100,000 steps in a day",
        icon: "🚀",
        category: AchievementCategory::Steps,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::DailySteps,
        requirement: 100_000,
        is_premium: true,
    },
    Achievement {
        id: AchievementId::StepWeek100k,
        name: "100K Week",
        description: "Walk 100,000 steps in one week",
        icon: "📅",
        category: AchievementCategory::Steps,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::WeekSteps,
        requirement: 100_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::StepMonth500k,
        name: "500K Month",
        description: "Walk 500,000 steps in one month",
        icon: "🗓️",
        category: AchievementCategory::Steps,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::MonthSteps,
        requirement: 500_000,
        is_premium: true,
    },
    Achievement {
        id: AchievementId::StepMillion,
        name: "Step Millionaire",
        description: "Walk 1,000,000 steps in total",
        icon: "💎",
        category: AchievementCategory::Steps,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::LifetimeSteps,
        requirement: 1_000_000,
        is_premium: false,
    },
    // === STREAK ===
    Achievement {
        id: AchievementId::Streak3,
        name: "Hat Trick",
        description: "Reach your goal 3 days in a row",
        icon: "🔥",
        category: AchievementCategory::Streak,
        rarity: Rarity::Common,
        metric: AchievementMetric::StreakDays,
        requirement: 3,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Streak7,
        name: "Week of Power",
        description: "Reach your goal 7 days in a row",
        icon: "⚡",
        category: AchievementCategory::Streak,
        rarity: Rarity::Rare,
        metric: AchievementMetric::StreakDays,
        requirement: 7,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Streak14,
        name: "Iron Will",
        description: "Reach your goal 14 days in a row",
        icon: "💪",
        category: AchievementCategory::Streak,
        rarity: Rarity::Epic,
        metric: AchievementMetric::StreakDays,
        requirement: 14,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Streak30,
        name: "Monthly Champion",
        description: "Reach your goal 30 days in a row",
        icon: "👑",
        category: AchievementCategory::Streak,
        rarity: Rarity::Epic,
        metric: AchievementMetric::StreakDays,
        requirement: 30,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Streak50,
        name: "Fifty Strong",
        description: "Reach your goal 50 days in a row",
        icon: "🎖️",
        category: AchievementCategory::Streak,
        rarity: Rarity::Epic,
        metric: AchievementMetric::StreakDays,
        requirement: 50,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Streak100,
        name: "Centurion",
        description: "Reach your goal 100 days in a row",
        icon: "🏆",
        category: AchievementCategory::Streak,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::StreakDays,
        requirement: 100,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Streak200,
        name: "Living Legend",
        description: "Reach your goal 200 days in a row",
        icon: "🌠",
        category: AchievementCategory::Streak,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::StreakDays,
        requirement: 200,
        is_premium: true,
    },
    Achievement {
        id: AchievementId::Streak365,
        name: "Year Titan",
        description: "Reach your goal 365 days in a row",
        icon: "🌟",
        category: AchievementCategory::Streak,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::StreakDays,
        requirement: 365,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Streak500,
        name: "Immortal",
        description: "Reach your goal 500 days in a row",
        icon: "♾️",
        category: AchievementCategory::Streak,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::StreakDays,
        requirement: 500,
        is_premium: true,
    },
    // === DISTANCE ===
    Achievement {
        id: AchievementId::Distance10Km,
        name: "Explorer",
        description: "Cover 10 km in total",
        icon: "🗺️",
        category: AchievementCategory::Distance,
        rarity: Rarity::Common,
        metric: AchievementMetric::LifetimeDistance,
        requirement: 10_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Distance25Km,
        name: "Wanderer",
        description: "Cover 25 km in total",
        icon: "🥾",
        category: AchievementCategory::Distance,
        rarity: Rarity::Rare,
        metric: AchievementMetric::LifetimeDistance,
        requirement: 25_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Distance50Km,
        name: "Traveler",
        description: "Cover 50 km in total",
        icon: "🧭",
        category: AchievementCategory::Distance,
        rarity: Rarity::Rare,
        metric: AchievementMetric::LifetimeDistance,
        requirement: 50_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Distance75Km,
        name: "Pathfinder",
        description: "Cover 75 km in total",
        icon: "⛰️",
        category: AchievementCategory::Distance,
        rarity: Rarity::Epic,
        metric: AchievementMetric::LifetimeDistance,
        requirement: 75_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Distance100Km,
        name: "Globetrotter",
        description: "Cover 100 km in total",
        icon: "🌍",
        category: AchievementCategory::Distance,
        rarity: Rarity::Epic,
        metric: AchievementMetric::LifetimeDistance,
        requirement: 100_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Distance200Km,
        name: "200 km Master",
        description: "Cover 200 km in total",
        icon: "🛤️",
        category: AchievementCategory::Distance,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::LifetimeDistance,
        requirement: 200_000,
        is_premium: true,
    },
    Achievement {
        id: AchievementId::DistanceMoon,
        name: "To the Moon",
        description: "Cover the distance to the Moon",
        icon: "🌙",
        category: AchievementCategory::Distance,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::LifetimeDistance,
        requirement: 384_400_000,
        is_premium: false,
    },
    // === CALORIES ===
    Achievement {
        id: AchievementId::Calories1000,
        name: "Burner",
        description: "Burn 1,000 kcal in a day",
        icon: "🔥",
        category: AchievementCategory::Calories,
        rarity: Rarity::Rare,
        metric: AchievementMetric::DailyCalories,
        requirement: 1000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Calories2500,
        name: "Furnace",
        description: "Burn 2,500 kcal in a day",
        icon: "♨️",
        category: AchievementCategory::Calories,
        rarity: Rarity::Epic,
        metric: AchievementMetric::DailyCalories,
        requirement: 2500,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Calories5000,
        name: "Inferno",
        description: "Burn 5,000 kcal in a day",
        icon: "💥",
        category: AchievementCategory::Calories,
        rarity: Rarity::Epic,
        metric: AchievementMetric::DailyCalories,
        requirement: 5000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Calories10000,
        name: "Volcano",
        description: "Burn 10,000 kcal in a day",
        icon: "🌋",
        category: AchievementCategory::Calories,
        rarity: Rarity::Epic,
        metric: AchievementMetric::DailyCalories,
        requirement: 10_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::Calories15000,
        name: "Wildfire",
        description: "Burn 15,000 kcal in one week",
        icon: "☄️",
        category: AchievementCategory::Calories,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::WeekCalories,
        requirement: 15_000,
        is_premium: true,
    },
    // === TIME ===
    Achievement {
        id: AchievementId::WeekendWarrior,
        name: "Weekend Warrior",
        description: "Walk 15,000 steps on a Saturday or Sunday",
        icon: "⚔️",
        category: AchievementCategory::Time,
        rarity: Rarity::Rare,
        metric: AchievementMetric::WeekendSteps,
        requirement: 15_000,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::MondayMotivation,
        name: "Monday Motivation",
        description: "Walk 10,000 steps on a Monday",
        icon: "💼",
        category: AchievementCategory::Time,
        rarity: Rarity::Rare,
        metric: AchievementMetric::MondaySteps,
        requirement: 10_000,
        is_premium: false,
    },
    // === SPECIAL ===
    Achievement {
        id: AchievementId::PerfectWeek,
        name: "Perfect Week",
        description: "Reach your goal every day of a week",
        icon: "✨",
        category: AchievementCategory::Special,
        rarity: Rarity::Epic,
        metric: AchievementMetric::GoalDaysThisWeek,
        requirement: 7,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::MarathonRunner,
        name: "Marathon Runner",
        description: "Cover 42.2 km in a day",
        icon: "🏃‍♂️",
        category: AchievementCategory::Special,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::DailyDistance,
        requirement: 42_200,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::NewYearWalker,
        name: "New Year Walker",
        description: "Reach your goal on January 1st",
        icon: "🎆",
        category: AchievementCategory::Special,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::SpecialDay { month: 1, day: 1 },
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::ValentineSteps,
        name: "Valentine Steps",
        description: "Reach your goal on February 14th",
        icon: "💘",
        category: AchievementCategory::Special,
        rarity: Rarity::Rare,
        metric: AchievementMetric::SpecialDay { month: 2, day: 14 },
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::HalloweenWalk,
        name: "Halloween Walk",
        description: "Reach your goal on October 31st",
        icon: "🎃",
        category: AchievementCategory::Special,
        rarity: Rarity::Rare,
        metric: AchievementMetric::SpecialDay { month: 10, day: 31 },
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::ChristmasWalk,
        name: "Christmas Walk",
        description: "Reach your goal on December 25th",
        icon: "🎄",
        category: AchievementCategory::Special,
        rarity: Rarity::Rare,
        metric: AchievementMetric::SpecialDay { month: 12, day: 25 },
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::NewYearChallenge,
        name: "Year-End Push",
        description: "Reach your goal on December 31st",
        icon: "🥂",
        category: AchievementCategory::Special,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::SpecialDay { month: 12, day: 31 },
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::SpringBloom,
        name: "Spring Bloom",
        description: "Reach your goal in spring",
        icon: "🌸",
        category: AchievementCategory::Special,
        rarity: Rarity::Rare,
        metric: AchievementMetric::SeasonGoal(Season::Spring),
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::SummerSun,
        name: "Summer Sun",
        description: "Reach your goal in summer",
        icon: "☀️",
        category: AchievementCategory::Special,
        rarity: Rarity::Rare,
        metric: AchievementMetric::SeasonGoal(Season::Summer),
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::AutumnLeaves,
        name: "Autumn Leaves",
        description: "Reach your goal in autumn",
        icon: "🍂",
        category: AchievementCategory::Special,
        rarity: Rarity::Rare,
        metric: AchievementMetric::SeasonGoal(Season::Autumn),
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::WinterFrost,
        name: "Winter Frost",
        description: "Reach your goal in winter",
        icon: "❄️",
        category: AchievementCategory::Special,
        rarity: Rarity::Rare,
        metric: AchievementMetric::SeasonGoal(Season::Winter),
        requirement: 1,
        is_premium: false,
    },
    Achievement {
        id: AchievementId::AchievementCollector,
        name: "Collector",
        description: "Unlock 30 achievements",
        icon: "🏵️",
        category: AchievementCategory::Special,
        rarity: Rarity::Legendary,
        metric: AchievementMetric::UnlockedCount,
        requirement: 30,
        is_premium: true,
    },
];

impl Achievement {
    /// Get achievement definition by ID
    pub fn get(id: AchievementId) -> Option<&'static Achievement> {
        ACHIEVEMENTS.iter().find(|a| a.id == id)
    }

    /// Get total number of achievements
    pub fn total_count() -> usize {
        ACHIEVEMENTS.len()
    }

    /// Get total possible bonus XP from all achievements
    pub fn total_xp() -> u64 {
        ACHIEVEMENTS.iter().map(|a| a.rarity.xp_bonus()).sum()
    }

    pub fn xp_bonus(&self) -> u64 {
        self.rarity.xp_bonus()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_matches_ids() {
        assert_eq!(ACHIEVEMENTS.len(), AchievementId::all().len());
        for id in AchievementId::all() {
            let def = Achievement::get(*id).unwrap();
            assert_eq!(def.id, *id);
            assert!(def.requirement > 0, "{} has no requirement", id);
        }
    }

    #[test]
    fn test_string_ids_roundtrip_and_unique() {
        let mut seen = HashSet::new();
        for id in AchievementId::all() {
            assert!(seen.insert(id.as_str()));
            assert_eq!(AchievementId::from_str(id.as_str()), Some(*id));
        }
        assert_eq!(AchievementId::from_str("missing"), None);
    }

    #[test]
    fn test_collector_is_reachable_without_premium() {
        let collector = Achievement::get(AchievementId::AchievementCollector).unwrap();
        let free = ACHIEVEMENTS
            .iter()
            .filter(|a| !a.is_premium && a.metric != AchievementMetric::UnlockedCount)
            .count() as u64;
        assert!(free >= collector.requirement);
    }

    #[test]
    fn test_rarity_bonus() {
        assert_eq!(Rarity::Common.xp_bonus(), 50);
        assert_eq!(Rarity::Legendary.xp_bonus(), 2_000);
        assert_eq!(
            Achievement::get(AchievementId::Streak7).unwrap().xp_bonus(),
            150
        );
    }

    #[test]
    fn test_season_of_month() {
        assert_eq!(Season::of_month(1), Season::Winter);
        assert_eq!(Season::of_month(4), Season::Spring);
        assert_eq!(Season::of_month(10), Season::Autumn);
        assert_eq!(Season::of_month(12), Season::Winter);
    }
}
