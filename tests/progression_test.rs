//! End-to-end properties of the synchronous progression engine

mod common;

use chrono::Duration;

use common::{day, engine_at, engine_from, free, premium, steps};
use stepquest::progression::achievements::{AchievementId, AchievementStatus};
use stepquest::progression::challenges::{ChallengeError, ChallengeKind, ParticipantProgress};
use stepquest::progression::pets::{EvolutionStage, PetKind};
use stepquest::progression::{level_of, ProgressionEvent, XpLedger};
use stepquest::store::{EntityKey, StoredBlob};
use stepquest::{Clock, MemoryStore};

// ========== XP and levels ==========

#[test]
fn test_same_signal_twice_is_idempotent() {
    let (_, mut engine) = engine_at(14);
    let signal = steps(14, 16_000, 40_000);

    let first = engine.on_activity_update(&signal, free());
    let generation = engine.generation();
    let second = engine.on_activity_update(&signal, free());

    assert!(first.xp_awarded > 0);
    assert_eq!(second.xp_awarded, 0);
    assert!(second.unlocked_achievement_ids.is_empty());
    assert!(second.completed_quest_ids.is_empty());
    assert_eq!(engine.generation(), generation);
    assert_eq!(second.snapshot.profile.total_xp, first.snapshot.profile.total_xp);
}

#[test]
fn test_total_xp_never_decreases() {
    let (_, mut engine) = engine_at(14);
    let signals = [
        steps(14, 4_000, 4_000),
        steps(14, 9_000, 9_000),
        // Regressed source values
        steps(14, 2_000, 3_000),
        steps(14, -50, -1),
        steps(14, 12_000, 12_000),
    ];

    let mut last = 0;
    for signal in &signals {
        let delta = engine.on_activity_update(signal, free());
        let total = delta.snapshot.profile.total_xp;
        assert!(total >= last, "XP went from {last} to {total}");
        assert_eq!(total, last + delta.xp_awarded);
        last = total;
    }
}

#[test]
fn test_level_depends_only_on_total_xp() {
    let mut chunked = XpLedger::default();
    for _ in 0..40 {
        chunked.award(125);
    }
    let mut single = XpLedger::default();
    let level_up = single.award(5_000).expect("5000 XP should level up");

    assert_eq!(chunked.total_xp(), single.total_xp());
    assert_eq!(chunked.level(), single.level());
    assert_eq!(single.level(), level_of(5_000));
    // Every level in between is reported once
    let expected: Vec<u32> = (2..=single.level()).collect();
    assert_eq!(level_up.levels_crossed, expected);
}

#[test]
fn test_delta_reports_every_crossed_level() {
    let (_, mut engine) = engine_at(14);
    let delta = engine.on_activity_update(&steps(14, 25_000, 25_000), free());

    let reached: Vec<u32> = delta
        .events
        .iter()
        .filter_map(|e| match e {
            ProgressionEvent::LevelReached { level } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(reached, delta.levels_crossed);
    assert_eq!(delta.new_level, reached.last().copied());
    assert_eq!(delta.snapshot.profile.level, level_of(delta.xp_awarded));
}

#[test]
fn test_history_before_first_signal_is_not_paid() {
    let (_, mut engine) = engine_at(14);
    let delta = engine.on_activity_update(&steps(14, 3_000, 2_000_000), free());
    let step_xp: u64 = delta
        .events
        .iter()
        .filter_map(|e| match e {
            ProgressionEvent::XpAwarded { amount, source } if source.as_str() == "steps" => Some(*amount),
            _ => None,
        })
        .sum();
    assert_eq!(step_xp, 30);
}

// ========== Achievements ==========

#[test]
fn test_achievement_unlocks_exactly_once() {
    let (clock, mut engine) = engine_at(14);

    let first = engine.on_activity_update(&steps(14, 10_500, 10_500), free());
    assert!(first.unlocked_achievement_ids.contains(&AchievementId::Step10k));
    let unlocked_at = engine
        .state()
        .achievements
        .state(AchievementId::Step10k)
        .and_then(|s| s.unlocked_at())
        .expect("Step10k should carry an unlock time");

    clock.advance(Duration::hours(3));
    let again = engine.on_activity_update(&steps(14, 11_000, 11_000), free());
    assert!(!again.unlocked_achievement_ids.contains(&AchievementId::Step10k));

    clock.advance_days(1);
    let next_day = engine.on_activity_update(&steps(15, 10_200, 21_200), free());
    assert!(!next_day.unlocked_achievement_ids.contains(&AchievementId::Step10k));

    let still = engine
        .state()
        .achievements
        .state(AchievementId::Step10k)
        .and_then(|s| s.unlocked_at());
    assert_eq!(still, Some(unlocked_at));
}

#[test]
fn test_premium_achievement_unlocks_retroactively_once() {
    let (clock, mut engine) = engine_at(14);

    let earned = engine.on_activity_update(&steps(14, 100_000, 100_000), free());
    assert!(!earned.unlocked_achievement_ids.contains(&AchievementId::Step100k));
    assert!(earned
        .events
        .contains(&ProgressionEvent::AchievementAwaitingPremium { id: AchievementId::Step100k }));
    assert_eq!(
        engine.state().achievements.status(AchievementId::Step100k),
        AchievementStatus::AwaitingPremium
    );
    let xp_before = engine.snapshot().profile.total_xp;

    clock.advance(Duration::hours(5));
    let upgrade_time = clock.now();
    let delta = engine
        .refresh_entitlements(premium())
        .expect("A signal was processed before, so a delta is produced");

    assert!(delta.unlocked_achievement_ids.contains(&AchievementId::Step100k));
    assert!(delta.events.contains(&ProgressionEvent::AchievementUnlocked {
        id: AchievementId::Step100k,
        xp: 2_000,
        retroactive: true,
    }));
    assert_eq!(
        engine
            .state()
            .achievements
            .state(AchievementId::Step100k)
            .and_then(|s| s.unlocked_at()),
        Some(upgrade_time)
    );
    assert!(delta.snapshot.profile.total_xp >= xp_before + 2_000);

    let repeat = engine.refresh_entitlements(premium()).expect("delta");
    assert!(repeat.unlocked_achievement_ids.is_empty());
    assert_eq!(repeat.xp_awarded, 0);
}

// ========== Streaks ==========

#[test]
fn test_streak_counts_consecutive_goal_days_and_resets() {
    let (clock, mut engine) = engine_at(10);
    let mut lifetime = 0;
    let mut streaks = Vec::new();

    for (offset, today) in [12_000, 11_000, 10_000, 2_000].into_iter().enumerate() {
        let d = 10 + offset as u32;
        lifetime += today;
        let delta = engine.on_activity_update(&steps(d, today, lifetime), free());
        streaks.push(delta.new_streak);
        clock.advance_days(1);
    }

    assert_eq!(streaks, vec![1, 2, 3, 0]);
    assert_eq!(engine.state().streak.best, 3);
}

#[test]
fn test_streak_miss_upgrades_when_goal_reached_later_that_day() {
    let (clock, mut engine) = engine_at(10);
    engine.on_activity_update(&steps(10, 12_000, 12_000), free());
    clock.advance_days(1);

    let morning = engine.on_activity_update(&steps(11, 500, 12_500), free());
    assert_eq!(morning.new_streak, 0);

    clock.advance(Duration::hours(9));
    let evening = engine.on_activity_update(&steps(11, 10_000, 22_000), free());
    assert_eq!(evening.new_streak, 2);
}

#[test]
fn test_skipped_day_resets_streak() {
    let (clock, mut engine) = engine_at(10);
    engine.on_activity_update(&steps(10, 12_000, 12_000), free());
    clock.advance_days(2);

    let delta = engine.on_activity_update(&steps(12, 12_000, 24_000), free());
    assert_eq!(delta.new_streak, 1);
}

// ========== Quests ==========

#[test]
fn test_quests_are_deterministic_per_day() {
    let (_, mut a) = engine_at(14);
    let (_, mut b) = engine_at(14);
    a.on_activity_update(&steps(14, 100, 100), free());
    b.on_activity_update(&steps(14, 200, 200), free());

    let ids = |quests: &[stepquest::progression::quests::DailyQuest]| -> Vec<String> {
        quests.iter().map(|q| q.template_id.clone()).collect()
    };
    assert_eq!(ids(a.snapshot().quests()), ids(b.snapshot().quests()));
    assert_eq!(a.snapshot().quests().len(), 3);
    assert!(a.snapshot().quests()[2].is_premium);
}

#[test]
fn test_quests_roll_over_at_day_change() {
    let (clock, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 100, 100), free());
    let old: Vec<String> = engine.snapshot().quests().iter().map(|q| q.id.clone()).collect();

    clock.advance_days(1);
    let delta = engine.on_activity_update(&steps(15, 100, 200), free());

    assert_eq!(delta.expired_quest_ids, old);
    assert!(delta
        .events
        .contains(&ProgressionEvent::QuestsGenerated { day: day(15) }));
    assert!(engine
        .snapshot()
        .quests()
        .iter()
        .all(|q| q.generated_day == day(15)));
}

#[test]
fn test_premium_quest_waits_for_premium() {
    let (_, mut engine) = engine_at(14);
    let delta = engine.on_activity_update(
        &steps(14, 30_000, 30_000)
            .with_distance(15_000.0)
            .with_calories(900.0)
            .with_active_minutes(120),
        free(),
    );

    let premium_quest = engine.snapshot().quests()[2].clone();
    assert!(!premium_quest.is_completed());
    assert_eq!(premium_quest.progress, 0);
    assert!(!delta.completed_quest_ids.contains(&premium_quest.id));

    let caught_up = engine.refresh_entitlements(premium()).expect("delta");
    assert!(caught_up.completed_quest_ids.contains(&premium_quest.id));
}

#[test]
fn test_refresh_quest_swaps_template() {
    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 100, 100), free());
    let before = engine.snapshot().quests()[0].clone();

    let replacement = engine.refresh_quest(&before.id).expect("Refresh should succeed");
    assert_ne!(replacement.template_id, before.template_id);
    assert_eq!(replacement.slot, 0);
    assert!(!replacement.is_premium);

    let templates: Vec<&str> = engine
        .state()
        .quests
        .quests
        .iter()
        .map(|q| q.template_id.as_str())
        .collect();
    let mut unique = templates.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), templates.len());
}

// ========== Challenges ==========

#[test]
fn test_challenge_completes_and_pays_once() {
    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 2_000, 2_000), free());
    let challenge = engine
        .create_challenge(ChallengeKind::DailySteps, 5_000, 3)
        .expect("Valid challenge");

    // Steps from before creation do not count
    let partial = engine.on_activity_update(&steps(14, 6_000, 6_000), free());
    assert!(partial.completed_challenge_ids.is_empty());

    let done = engine.on_activity_update(&steps(14, 7_500, 7_500), free());
    assert_eq!(done.completed_challenge_ids, vec![challenge.id]);
    assert!(done.events.contains(&ProgressionEvent::ChallengeCompleted {
        id: challenge.id,
        xp: ChallengeKind::DailySteps.xp_reward(),
    }));

    let after = engine.on_activity_update(&steps(14, 9_000, 9_000), free());
    assert!(after.completed_challenge_ids.is_empty());
}

#[test]
fn test_challenge_validation() {
    let (_, mut engine) = engine_at(14);
    assert_eq!(
        engine.create_challenge(ChallengeKind::WeeklySteps, 0, 7),
        Err(ChallengeError::InvalidTarget)
    );
    assert_eq!(
        engine.create_challenge(ChallengeKind::WeeklySteps, 50_000, 0),
        Err(ChallengeError::InvalidDuration(0))
    );
}

#[test]
fn test_group_standings_break_ties_by_list_order() {
    let (_, mut engine) = engine_at(14);
    engine.refresh_entitlements(premium());

    let group = engine
        .create_group_challenge(
            "Office",
            ChallengeKind::WeeklySteps,
            10_000,
            7,
            vec![
                ParticipantProgress {
                    id: "user".into(),
                    name: "Me".into(),
                    progress: 0,
                },
                ParticipantProgress {
                    id: "ana".into(),
                    name: "Ana".into(),
                    progress: 50,
                },
                ParticipantProgress {
                    id: "bo".into(),
                    name: "Bo".into(),
                    progress: 30,
                },
            ],
        )
        .expect("Premium may create groups");

    engine.on_activity_update(&steps(14, 50, 50), premium());

    let group = engine.state().groups.get(group.id).expect("group exists");
    let ranks: Vec<(String, usize)> = group.standings().into_iter().map(|s| (s.id, s.rank)).collect();
    assert_eq!(
        ranks,
        vec![("user".to_string(), 1), ("ana".to_string(), 2), ("bo".to_string(), 3)]
    );
    assert_eq!(group.total_progress(), 130);
}

#[test]
fn test_group_requires_premium() {
    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 50, 50), free());
    assert_eq!(
        engine.create_group_challenge("Solo", ChallengeKind::DailySteps, 5_000, 3, Vec::new()),
        Err(ChallengeError::PremiumRequired)
    );
}

// ========== Pets ==========

#[test]
fn test_pet_grows_with_share_of_xp() {
    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 100, 100), free());
    let pet = engine.create_pet("Miso", PetKind::Cat).expect("Free cat");

    let delta = engine.on_activity_update(&steps(14, 10_100, 10_100), free());
    let fed = engine.state().pets.get(pet.id).expect("pet").total_xp;
    let total = delta.snapshot.profile.total_xp;
    assert_eq!(fed, engine.settings().pet_share(total - delta.xp_awarded, total));
    assert_eq!(engine.state().pets.get(pet.id).map(|p| p.stage()), Some(EvolutionStage::Baby));
}

#[test]
fn test_small_awards_still_feed_the_pet() {
    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 100, 100), free());
    let pet = engine.create_pet("Miso", PetKind::Cat).expect("Free cat");
    let start = engine.snapshot().profile.total_xp;

    // One step-XP point per signal
    for i in 2..=201 {
        engine.on_activity_update(&steps(14, i * 100, i * 100), free());
    }

    let earned = engine.snapshot().profile.total_xp - start;
    let fed = engine.state().pets.get(pet.id).expect("pet").total_xp;
    assert!(earned >= 200);
    assert!(fed + 1 >= earned / 2, "pet got {fed} of {earned}");
    assert!(fed <= earned / 2 + 1);
}

#[test]
fn test_lapsed_premium_switches_to_free_pet() {
    let (_, mut engine) = engine_at(14);
    engine.refresh_entitlements(premium());
    let cat = engine.create_pet("Miso", PetKind::Cat).expect("cat");
    let fox = engine.create_pet("Rusty", PetKind::Fox).expect("fox");
    assert_eq!(engine.state().pets.active, Some(fox.id));

    engine.refresh_entitlements(free());
    assert_eq!(engine.state().pets.active, Some(cat.id));
}

// ========== Persistence ==========

#[test]
fn test_state_survives_reload() {
    let store = MemoryStore::new();
    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 12_000, 12_000), free());
    engine.create_pet("Miso", PetKind::Cat).expect("cat");
    engine.persist_to(&store).expect("Memory store accepts writes");

    let (_, restored) = engine_from(&store, 14);
    assert_eq!(restored.state(), engine.state());
    assert_eq!(restored.generation(), engine.generation());
}

#[test]
fn test_corrupt_entity_loads_as_zero_state() {
    let store = MemoryStore::new();
    let (_, mut engine) = engine_at(14);
    engine.on_activity_update(&steps(14, 12_000, 12_000), free());
    engine.persist_to(&store).expect("persist");

    store.put_raw(
        EntityKey::Profile,
        StoredBlob {
            schema_version: 1,
            generation: 99,
            payload: "{not json".to_string(),
        },
    );
    store.put_raw(
        EntityKey::Streak,
        StoredBlob {
            schema_version: 999,
            generation: 99,
            payload: "{}".to_string(),
        },
    );

    let (_, restored) = engine_from(&store, 14);
    assert_eq!(restored.snapshot().profile.total_xp, 0);
    assert_eq!(restored.state().streak.current, 0);
    // Untouched entities still load
    assert_eq!(restored.state().achievements, engine.state().achievements);
}
