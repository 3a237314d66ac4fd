//! Per-achievement progress and unlock state
//!
//! Each definition moves `Locked -> InProgress -> Unlocked`. Progress is the
//! running maximum of what the metrics have shown, so corrected (lower)
//! readings never take it back. Premium definitions that meet their
//! requirement without a subscription are recorded as earned and unlock the
//! next time a cycle runs with premium active.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::checker::MetricSet;
use super::definitions::{Achievement, AchievementId, AchievementMetric, ACHIEVEMENTS};

/// When an achievement was unlocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unlock {
    At(DateTime<Utc>),
    /// Recovered from a record whose timestamp was lost
    UnknownTime,
}

/// Stored runtime state for one definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementState {
    #[serde(default)]
    pub progress: u64,
    /// Requirement met while the subscription gate was closed
    #[serde(default)]
    pub earned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unlocked: Option<Unlock>,
}

impl AchievementState {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.is_some()
    }

    pub fn unlocked_at(&self) -> Option<DateTime<Utc>> {
        match self.unlocked {
            Some(Unlock::At(at)) => Some(at),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementStatus {
    Locked,
    InProgress,
    /// Requirement met, waiting for premium
    AwaitingPremium,
    Unlocked,
}

/// An achievement that was just unlocked
#[derive(Debug, Clone)]
pub struct UnlockedAchievement {
    pub achievement: &'static Achievement,
    pub unlocked_at: DateTime<Utc>,
    pub xp: u64,
    /// Earned earlier while premium was inactive
    pub retroactive: bool,
}

/// Result of one evaluation pass
#[derive(Debug, Clone, Default)]
pub struct AchievementOutcome {
    pub unlocked: Vec<UnlockedAchievement>,
    /// Requirement newly met but held back by the premium gate
    pub awaiting_premium: Vec<AchievementId>,
}

impl AchievementOutcome {
    pub fn xp(&self) -> u64 {
        self.unlocked.iter().map(|u| u.xp).sum()
    }
}

/// Read model of one achievement for observers
#[derive(Debug, Clone)]
pub struct AchievementView {
    pub achievement: &'static Achievement,
    pub progress: u64,
    pub status: AchievementStatus,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// All achievement states, keyed by stable string ID
///
/// Unknown keys from other catalog versions are kept untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementBook {
    states: BTreeMap<String, AchievementState>,
}

impl AchievementBook {
    pub fn state(&self, id: AchievementId) -> Option<&AchievementState> {
        self.states.get(id.as_str())
    }

    pub fn progress(&self, id: AchievementId) -> u64 {
        self.state(id).map(|s| s.progress).unwrap_or(0)
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.state(id).is_some_and(AchievementState::is_unlocked)
    }

    pub fn status(&self, id: AchievementId) -> AchievementStatus {
        match self.state(id) {
            Some(s) if s.is_unlocked() => AchievementStatus::Unlocked,
            Some(s) if s.earned_at.is_some() => AchievementStatus::AwaitingPremium,
            Some(s) if s.progress > 0 => AchievementStatus::InProgress,
            _ => AchievementStatus::Locked,
        }
    }

    /// Unlocked catalog achievements
    pub fn unlocked_count(&self) -> usize {
        AchievementId::all()
            .iter()
            .filter(|id| self.is_unlocked(**id))
            .count()
    }

    /// Advance every definition against `metrics`
    ///
    /// Count-of-unlocks definitions run after the rest so they see this
    /// pass's unlocks.
    pub fn evaluate(&mut self, metrics: &MetricSet, premium: bool, now: DateTime<Utc>) -> AchievementOutcome {
        let mut outcome = AchievementOutcome::default();
        let mut metrics = metrics.clone();

        for counts_unlocks in [false, true] {
            if counts_unlocks {
                metrics.unlocked_count = self.unlocked_count() as u64;
            }
            for def in ACHIEVEMENTS
                .iter()
                .filter(|a| (a.metric == AchievementMetric::UnlockedCount) == counts_unlocks)
            {
                self.advance(def, &metrics, premium, now, &mut outcome);
            }
        }

        outcome
    }

    fn advance(
        &mut self,
        def: &'static Achievement,
        metrics: &MetricSet,
        premium: bool,
        now: DateTime<Utc>,
        outcome: &mut AchievementOutcome,
    ) {
        let state = self.states.entry(def.id.as_str().to_string()).or_default();

        let computed = metrics.value(def.metric).min(def.requirement);
        state.progress = state.progress.max(computed);

        if state.is_unlocked() || state.progress < def.requirement {
            return;
        }

        if def.is_premium && !premium {
            if state.earned_at.is_none() {
                state.earned_at = Some(now);
                info!(achievement = %def.id, "Achievement earned, waiting for premium");
                outcome.awaiting_premium.push(def.id);
            }
            return;
        }

        let retroactive = state.earned_at.is_some();
        state.unlocked = Some(Unlock::At(now));
        info!(achievement = %def.id, retroactive, "Achievement unlocked");
        outcome.unlocked.push(UnlockedAchievement {
            achievement: def,
            unlocked_at: now,
            xp: def.xp_bonus(),
            retroactive,
        });
    }

    /// Repair records that met their requirement but lost their unlock
    ///
    /// Such records are marked unlocked with an unknown time and no bonus is
    /// paid again. Returns the repaired IDs.
    pub fn heal(&mut self) -> Vec<AchievementId> {
        let mut healed = Vec::new();
        for def in ACHIEVEMENTS {
            let Some(state) = self.states.get_mut(def.id.as_str()) else {
                continue;
            };
            if state.unlocked.is_none()
                && state.earned_at.is_none()
                && state.progress >= def.requirement
            {
                error!(
                    achievement = %def.id,
                    progress = state.progress,
                    "Achievement met its requirement without an unlock record, marking unlocked"
                );
                state.unlocked = Some(Unlock::UnknownTime);
                healed.push(def.id);
            }
        }
        healed
    }

    /// Catalog-ordered read model
    pub fn views(&self) -> Vec<AchievementView> {
        ACHIEVEMENTS
            .iter()
            .map(|def| {
                let state = self.state(def.id);
                AchievementView {
                    achievement: def,
                    progress: state.map(|s| s.progress).unwrap_or(0),
                    status: self.status(def.id),
                    unlocked_at: state.and_then(AchievementState::unlocked_at),
                }
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, id: AchievementId, state: AchievementState) {
        self.states.insert(id.as_str().to_string(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::activity::{ActivityLedger, ActivitySnapshot};
    use crate::progression::streaks::StreakRecord;
    use chrono::{NaiveDate, TimeZone};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, hour, 0, 0).unwrap()
    }

    fn metrics(steps: i64) -> MetricSet {
        let mut ledger = ActivityLedger::default();
        let reading = ledger.absorb(&ActivitySnapshot::steps(day(), steps, steps), day(), 10_000);
        MetricSet::new(&reading, &StreakRecord::default(), 10_000)
    }

    #[test]
    fn test_unlock_happens_once() {
        let mut book = AchievementBook::default();
        let first = book.evaluate(&metrics(5_500), false, at(9));
        let ids: Vec<_> = first.unlocked.iter().map(|u| u.achievement.id).collect();
        assert!(ids.contains(&AchievementId::FirstSteps));
        assert!(ids.contains(&AchievementId::Step5k));
        assert_eq!(first.xp(), 50 + 50);

        let second = book.evaluate(&metrics(5_500), false, at(10));
        assert!(second.unlocked.is_empty());
        assert_eq!(
            book.state(AchievementId::Step5k).unwrap().unlocked_at(),
            Some(at(9))
        );
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut book = AchievementBook::default();
        book.evaluate(&metrics(7_000), false, at(9));
        assert_eq!(book.progress(AchievementId::Step10k), 7_000);

        book.evaluate(&metrics(4_000), false, at(10));
        assert_eq!(book.progress(AchievementId::Step10k), 7_000);
        assert_eq!(book.status(AchievementId::Step10k), AchievementStatus::InProgress);
        assert_eq!(book.status(AchievementId::Step50k), AchievementStatus::InProgress);
    }

    #[test]
    fn test_premium_gate_defers_unlock() {
        let mut book = AchievementBook::default();
        let gated = book.evaluate(&metrics(100_000), false, at(9));
        assert!(gated.awaiting_premium.contains(&AchievementId::Step100k));
        assert!(!gated
            .unlocked
            .iter()
            .any(|u| u.achievement.id == AchievementId::Step100k));
        assert_eq!(
            book.status(AchievementId::Step100k),
            AchievementStatus::AwaitingPremium
        );

        // Still gated: no duplicate notice
        let again = book.evaluate(&metrics(100_000), false, at(10));
        assert!(again.awaiting_premium.is_empty());

        let unlocked = book.evaluate(&metrics(0), true, at(15));
        let step100k: Vec<_> = unlocked
            .unlocked
            .iter()
            .filter(|u| u.achievement.id == AchievementId::Step100k)
            .collect();
        assert_eq!(step100k.len(), 1);
        assert!(step100k[0].retroactive);
        assert_eq!(step100k[0].unlocked_at, at(15));
        assert_eq!(
            book.state(AchievementId::Step100k).unwrap().unlocked_at(),
            Some(at(15))
        );
    }

    #[test]
    fn test_heal_marks_unknown_without_bonus() {
        let mut book = AchievementBook::default();
        book.insert_raw(
            AchievementId::Step10k,
            AchievementState {
                progress: 10_000,
                earned_at: None,
                unlocked: None,
            },
        );

        assert_eq!(book.heal(), vec![AchievementId::Step10k]);
        assert_eq!(
            book.state(AchievementId::Step10k).unwrap().unlocked,
            Some(Unlock::UnknownTime)
        );

        let outcome = book.evaluate(&metrics(10_000), false, at(9));
        assert!(!outcome
            .unlocked
            .iter()
            .any(|u| u.achievement.id == AchievementId::Step10k));
        assert!(book.heal().is_empty());
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let json = r#"{"retired_badge":{"progress":3},"step_5k":{"progress":10}}"#;
        let book: AchievementBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.progress(AchievementId::Step5k), 10);

        let out = serde_json::to_string(&book).unwrap();
        assert!(out.contains("retired_badge"));
    }
}
