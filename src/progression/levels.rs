//! XP and Level system
//!
//! Defines level thresholds, ranks, and the XP ledger.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Highest reachable level
pub const MAX_LEVEL: u32 = 100;

/// XP required for each level, index 0 is level 1
static THRESHOLDS: Lazy<Vec<u64>> = Lazy::new(|| {
    std::iter::once(0)
        .chain((2..=MAX_LEVEL).map(|level| {
            let raw = 50.0 * f64::from(level).powf(1.8);
            // Guard against powf landing a hair under an exact integer
            (raw + 1e-6).floor() as u64
        }))
        .collect()
});

/// Ascending XP thresholds, one per level
pub fn level_thresholds() -> &'static [u64] {
    &THRESHOLDS
}

/// Total XP at which `level` is reached (None beyond max level)
pub fn xp_for_level(level: u32) -> Option<u64> {
    let index = level.checked_sub(1)? as usize;
    THRESHOLDS.get(index).copied()
}

/// Level for a total XP: the count of thresholds at or below it
pub fn level_of(total_xp: u64) -> u32 {
    THRESHOLDS.partition_point(|&threshold| threshold <= total_xp) as u32
}

/// Coarse progression title, changing only at fixed levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Beginner,
    Walker,
    Hiker,
    Explorer,
    Adventurer,
    Athlete,
    Champion,
    Legend,
    Master,
    Grandmaster,
}

impl Rank {
    pub fn all() -> &'static [Rank] {
        &[
            Rank::Beginner,
            Rank::Walker,
            Rank::Hiker,
            Rank::Explorer,
            Rank::Adventurer,
            Rank::Athlete,
            Rank::Champion,
            Rank::Legend,
            Rank::Master,
            Rank::Grandmaster,
        ]
    }

    /// First level carrying this rank
    pub fn min_level(&self) -> u32 {
        match self {
            Rank::Beginner => 1,
            Rank::Walker => 5,
            Rank::Hiker => 10,
            Rank::Explorer => 20,
            Rank::Adventurer => 30,
            Rank::Athlete => 40,
            Rank::Champion => 50,
            Rank::Legend => 65,
            Rank::Master => 80,
            Rank::Grandmaster => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Beginner => "beginner",
            Rank::Walker => "walker",
            Rank::Hiker => "hiker",
            Rank::Explorer => "explorer",
            Rank::Adventurer => "adventurer",
            Rank::Athlete => "athlete",
            Rank::Champion => "champion",
            Rank::Legend => "legend",
            Rank::Master => "master",
            Rank::Grandmaster => "grandmaster",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Rank::Beginner => "Beginner",
            Rank::Walker => "Walker",
            Rank::Hiker => "Hiker",
            Rank::Explorer => "Explorer",
            Rank::Adventurer => "Adventurer",
            Rank::Athlete => "Athlete",
            Rank::Champion => "Champion",
            Rank::Legend => "Legend",
            Rank::Master => "Master",
            Rank::Grandmaster => "Grandmaster",
        }
    }

    pub fn for_level(level: u32) -> Rank {
        Self::all()
            .iter()
            .rev()
            .find(|rank| level >= rank.min_level())
            .copied()
            .unwrap_or(Rank::Beginner)
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

pub fn rank_of(level: u32) -> Rank {
    Rank::for_level(level)
}

/// Result of an award that crossed at least one threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    /// Every level reached by this award, ascending
    pub levels_crossed: Vec<u32>,
    pub old_rank: Rank,
    pub new_rank: Rank,
}

impl LevelUp {
    pub fn rank_changed(&self) -> bool {
        self.old_rank != self.new_rank
    }
}

/// Owner of the player's total XP
///
/// Only the total is stored; level and rank are recomputed from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpLedger {
    total_xp: u64,
}

impl XpLedger {
    pub fn new(total_xp: u64) -> Self {
        Self { total_xp }
    }

    pub fn total_xp(&self) -> u64 {
        self.total_xp
    }

    pub fn level(&self) -> u32 {
        level_of(self.total_xp)
    }

    pub fn rank(&self) -> Rank {
        rank_of(self.level())
    }

    /// Add XP, reporting the levels crossed if any
    pub fn award(&mut self, amount: u64) -> Option<LevelUp> {
        if amount == 0 {
            return None;
        }

        let old_level = self.level();
        self.total_xp = self.total_xp.saturating_add(amount);
        let new_level = self.level();

        if new_level > old_level {
            Some(LevelUp {
                old_level,
                new_level,
                levels_crossed: ((old_level + 1)..=new_level).collect(),
                old_rank: rank_of(old_level),
                new_rank: rank_of(new_level),
            })
        } else {
            None
        }
    }
}

/// Read model of the ledger for observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerProfile {
    pub total_xp: u64,
    pub level: u32,
    pub rank: Rank,
    /// XP at which the current level started
    pub current_level_xp: u64,
    /// XP needed for next level (None if max)
    pub next_level_xp: Option<u64>,
}

impl PlayerProfile {
    pub fn new(total_xp: u64) -> Self {
        let level = level_of(total_xp);
        Self {
            total_xp,
            level,
            rank: rank_of(level),
            current_level_xp: xp_for_level(level).unwrap_or(0),
            next_level_xp: xp_for_level(level + 1),
        }
    }

    /// Calculate progress percentage to next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f32 {
        match self.next_level_xp {
            Some(next) => {
                let xp_in_level = self.total_xp - self.current_level_xp;
                let xp_for_level = next - self.current_level_xp;
                if xp_for_level == 0 {
                    1.0
                } else {
                    (xp_in_level as f32) / (xp_for_level as f32)
                }
            }
            None => 1.0,
        }
    }

    pub fn xp_to_next(&self) -> Option<u64> {
        self.next_level_xp.map(|next| next - self.total_xp)
    }

    pub fn is_max_level(&self) -> bool {
        self.next_level_xp.is_none()
    }
}

impl From<&XpLedger> for PlayerProfile {
    fn from(ledger: &XpLedger) -> Self {
        PlayerProfile::new(ledger.total_xp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let t = level_thresholds();
        assert_eq!(t.len(), MAX_LEVEL as usize);
        assert_eq!(t[0], 0);
        assert_eq!(xp_for_level(2), Some(174));
        assert_eq!(xp_for_level(10), Some(3154));
        assert_eq!(xp_for_level(32), Some(25_600));
        assert_eq!(xp_for_level(100), Some(199_053));
        assert_eq!(xp_for_level(101), None);
        assert_eq!(xp_for_level(0), None);
        assert!(t.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_level_of() {
        assert_eq!(level_of(0), 1);
        assert_eq!(level_of(173), 1);
        assert_eq!(level_of(174), 2);
        assert_eq!(level_of(3154), 10);
        assert_eq!(level_of(199_053), 100);
        assert_eq!(level_of(u64::MAX), 100);
    }

    #[test]
    fn test_rank_checkpoints() {
        assert_eq!(rank_of(1), Rank::Beginner);
        assert_eq!(rank_of(4), Rank::Beginner);
        assert_eq!(rank_of(5), Rank::Walker);
        assert_eq!(rank_of(64), Rank::Champion);
        assert_eq!(rank_of(65), Rank::Legend);
        assert_eq!(rank_of(100), Rank::Grandmaster);
    }

    #[test]
    fn test_award_zero_is_noop() {
        let mut ledger = XpLedger::new(173);
        assert_eq!(ledger.award(0), None);
        assert_eq!(ledger.total_xp(), 173);
    }

    #[test]
    fn test_award_reports_every_crossed_level() {
        let mut ledger = XpLedger::default();
        let up = ledger.award(3_200).unwrap();
        assert_eq!(up.old_level, 1);
        assert_eq!(up.new_level, 10);
        assert_eq!(up.levels_crossed, (2..=10).collect::<Vec<_>>());
        assert_eq!(up.old_rank, Rank::Beginner);
        assert_eq!(up.new_rank, Rank::Hiker);
        assert!(up.rank_changed());

        assert_eq!(ledger.award(1), None);
    }

    #[test]
    fn test_level_is_path_independent() {
        let mut a = XpLedger::default();
        let mut b = XpLedger::default();
        a.award(5_000);
        for _ in 0..50 {
            b.award(100);
        }
        assert_eq!(a, b);
        assert_eq!(a.level(), b.level());
        assert_eq!(a.rank(), b.rank());
    }

    #[test]
    fn test_player_profile_progress() {
        // Between level 2 (174) and level 3 (361)
        let profile = PlayerProfile::new(174 + 187 / 2);
        assert_eq!(profile.level, 2);
        assert!((profile.progress_to_next() - 0.497).abs() < 0.01);
        assert_eq!(profile.xp_to_next(), Some(361 - 267));

        let maxed = PlayerProfile::new(300_000);
        assert!(maxed.is_max_level());
        assert_eq!(maxed.progress_to_next(), 1.0);
    }
}
