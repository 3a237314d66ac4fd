//! Pet Growth Engine
//!
//! Pets grow from a share of the XP the player earns. Evolution stage and
//! accessory unlocks are pure functions of a pet's total XP; equipping is a
//! user action.

mod accessories;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub use accessories::{unlocked_at, Accessory, AccessoryCategory, AccessoryId, ACCESSORIES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetKind {
    Cat,
    Poodle,
    Rabbit,
    Fox,
    Penguin,
}

impl PetKind {
    pub fn all() -> &'static [PetKind] {
        &[
            PetKind::Cat,
            PetKind::Poodle,
            PetKind::Rabbit,
            PetKind::Fox,
            PetKind::Penguin,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PetKind::Cat => "cat",
            PetKind::Poodle => "poodle",
            PetKind::Rabbit => "rabbit",
            PetKind::Fox => "fox",
            PetKind::Penguin => "penguin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PetKind::Cat => "Cat",
            PetKind::Poodle => "Poodle",
            PetKind::Rabbit => "Rabbit",
            PetKind::Fox => "Fox",
            PetKind::Penguin => "Penguin",
        }
    }

    pub fn requires_premium(&self) -> bool {
        *self != PetKind::Cat
    }
}

impl std::fmt::Display for PetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStage {
    Baby,
    Teen,
    Adult,
    Champion,
    Legend,
}

impl EvolutionStage {
    pub fn all() -> &'static [EvolutionStage] {
        &[
            EvolutionStage::Baby,
            EvolutionStage::Teen,
            EvolutionStage::Adult,
            EvolutionStage::Champion,
            EvolutionStage::Legend,
        ]
    }

    pub fn required_xp(&self) -> u64 {
        match self {
            EvolutionStage::Baby => 0,
            EvolutionStage::Teen => 10_000,
            EvolutionStage::Adult => 50_000,
            EvolutionStage::Champion => 150_000,
            EvolutionStage::Legend => 500_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvolutionStage::Baby => "baby",
            EvolutionStage::Teen => "teen",
            EvolutionStage::Adult => "adult",
            EvolutionStage::Champion => "champion",
            EvolutionStage::Legend => "legend",
        }
    }

    pub fn next(&self) -> Option<EvolutionStage> {
        Self::all().iter().copied().find(|s| s > self)
    }
}

impl std::fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage reached with `xp`
pub fn evolution_stage_of(xp: u64) -> EvolutionStage {
    EvolutionStage::all()
        .iter()
        .rev()
        .copied()
        .find(|s| s.required_xp() <= xp)
        .unwrap_or(EvolutionStage::Baby)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetMood {
    Ecstatic,
    Happy,
    Content,
    Sad,
    Tired,
}

impl PetMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            PetMood::Ecstatic => "ecstatic",
            PetMood::Happy => "happy",
            PetMood::Content => "content",
            PetMood::Sad => "sad",
            PetMood::Tired => "tired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub kind: PetKind,
    pub total_xp: u64,
    #[serde(default)]
    pub unlocked_accessories: BTreeSet<AccessoryId>,
    #[serde(default)]
    pub equipped: BTreeMap<AccessoryCategory, AccessoryId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_fed_at: Option<DateTime<Utc>>,
}

impl Pet {
    fn new(name: &str, kind: PetKind, now: DateTime<Utc>) -> Self {
        let name = name.trim();
        Self {
            id: Uuid::new_v4(),
            name: if name.is_empty() {
                kind.display_name().to_string()
            } else {
                name.to_string()
            },
            kind,
            total_xp: 0,
            unlocked_accessories: BTreeSet::new(),
            equipped: BTreeMap::new(),
            created_at: now,
            last_fed_at: None,
        }
    }

    pub fn stage(&self) -> EvolutionStage {
        evolution_stage_of(self.total_xp)
    }

    /// XP left until the next stage, `None` at the last one
    pub fn xp_to_next_stage(&self) -> Option<u64> {
        self.stage()
            .next()
            .map(|next| next.required_xp().saturating_sub(self.total_xp))
    }

    /// Progress within the current stage (0.0 - 1.0)
    pub fn stage_progress(&self) -> f64 {
        let stage = self.stage();
        let Some(next) = stage.next() else {
            return 1.0;
        };
        let span = next.required_xp() - stage.required_xp();
        (self.total_xp - stage.required_xp()) as f64 / span as f64
    }

    pub fn mood(&self, today_steps: u64, now: DateTime<Utc>) -> PetMood {
        if today_steps >= 15_000 {
            return PetMood::Ecstatic;
        }
        if today_steps >= 10_000 {
            return PetMood::Happy;
        }
        if today_steps >= 5_000 {
            return PetMood::Content;
        }
        match self.last_fed_at {
            Some(fed) if (now - fed).num_hours() <= 24 => PetMood::Sad,
            _ => PetMood::Tired,
        }
    }

    pub fn days_old(&self, now: DateTime<Utc>) -> i64 {
        (now.date_naive() - self.created_at.date_naive()).num_days().max(0)
    }
}

/// Result of feeding the active pet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetGrowth {
    pub pet_id: Uuid,
    pub xp: u64,
    /// Set when the stage changed
    pub new_stage: Option<EvolutionStage>,
    pub unlocked: Vec<AccessoryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PetError {
    #[error("{0} pets require premium")]
    PremiumKind(PetKind),

    #[error("free accounts can keep one pet")]
    PetLimit,

    #[error("pet not found: {0}")]
    NotFound(Uuid),

    #[error("no pet selected")]
    NoActivePet,

    #[error("accessory {0} is not unlocked yet")]
    AccessoryLocked(AccessoryId),

    #[error("accessory {0} requires premium")]
    PremiumAccessory(AccessoryId),
}

/// All pets and which one is active
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRoster {
    #[serde(default)]
    pub pets: Vec<Pet>,
    #[serde(default)]
    pub active: Option<Uuid>,
}

impl PetRoster {
    pub fn active_pet(&self) -> Option<&Pet> {
        let id = self.active?;
        self.pets.iter().find(|p| p.id == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Pet, PetError> {
        self.pets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PetError::NotFound(id))
    }

    /// Adopt a pet and make it active
    pub fn create(&mut self, name: &str, kind: PetKind, premium: bool, now: DateTime<Utc>) -> Result<Pet, PetError> {
        if kind.requires_premium() && !premium {
            return Err(PetError::PremiumKind(kind));
        }
        if !premium && !self.pets.is_empty() {
            return Err(PetError::PetLimit);
        }

        let pet = Pet::new(name, kind, now);
        info!(id = %pet.id, kind = %kind, name = %pet.name, "Adopted pet");
        self.active = Some(pet.id);
        self.pets.push(pet.clone());
        Ok(pet)
    }

    pub fn select(&mut self, id: Uuid, premium: bool) -> Result<(), PetError> {
        let pet = self.get(id).ok_or(PetError::NotFound(id))?;
        if pet.kind.requires_premium() && !premium {
            return Err(PetError::PremiumKind(pet.kind));
        }
        self.active = Some(id);
        Ok(())
    }

    pub fn rename(&mut self, id: Uuid, name: &str) -> Result<(), PetError> {
        let name = name.trim();
        let pet = self.get_mut(id)?;
        if !name.is_empty() {
            pet.name = name.to_string();
        }
        Ok(())
    }

    /// Remove a pet; the first remaining one becomes active if it was
    pub fn delete(&mut self, id: Uuid) -> Result<Pet, PetError> {
        let index = self
            .pets
            .iter()
            .position(|p| p.id == id)
            .ok_or(PetError::NotFound(id))?;
        let removed = self.pets.remove(index);
        if self.active == Some(id) {
            self.active = self.pets.first().map(|p| p.id);
        }
        Ok(removed)
    }

    /// Equip on the active pet, replacing whatever its slot held
    pub fn equip(&mut self, accessory: AccessoryId, premium: bool) -> Result<(), PetError> {
        let def = accessory.def();
        if def.is_premium && !premium {
            return Err(PetError::PremiumAccessory(accessory));
        }
        let id = self.active.ok_or(PetError::NoActivePet)?;
        let pet = self.get_mut(id)?;
        if !pet.unlocked_accessories.contains(&accessory) {
            return Err(PetError::AccessoryLocked(accessory));
        }
        pet.equipped.insert(def.category, accessory);
        Ok(())
    }

    /// Clear a slot on the active pet; clearing an empty slot is fine
    pub fn unequip(&mut self, category: AccessoryCategory) -> Result<Option<AccessoryId>, PetError> {
        let id = self.active.ok_or(PetError::NoActivePet)?;
        Ok(self.get_mut(id)?.equipped.remove(&category))
    }

    /// Grow the active pet by `xp`
    pub fn feed_active(&mut self, xp: u64, now: DateTime<Utc>) -> Option<PetGrowth> {
        if xp == 0 {
            return None;
        }
        let id = self.active?;
        let pet = self.pets.iter_mut().find(|p| p.id == id)?;

        let old_stage = pet.stage();
        pet.total_xp = pet.total_xp.saturating_add(xp);
        pet.last_fed_at = Some(now);

        let unlocked: Vec<AccessoryId> = unlocked_at(pet.total_xp)
            .map(|a| a.id)
            .filter(|id| pet.unlocked_accessories.insert(*id))
            .collect();

        let stage = pet.stage();
        let new_stage = (stage != old_stage).then_some(stage);
        if let Some(stage) = new_stage {
            info!(pet = %pet.name, stage = %stage, "Pet evolved");
        }

        Some(PetGrowth {
            pet_id: id,
            xp,
            new_stage,
            unlocked,
        })
    }

    /// Drop premium privileges when the subscription lapses
    ///
    /// A premium active pet is swapped for the first free one, adopting a
    /// base cat when there is none. Premium accessories are taken off.
    pub fn enforce_entitlement(&mut self, premium: bool, now: DateTime<Utc>) -> bool {
        if premium || self.pets.is_empty() {
            return false;
        }

        let mut changed = false;
        for pet in self.pets.iter_mut() {
            let before = pet.equipped.len();
            pet.equipped.retain(|_, id| !id.def().is_premium);
            changed |= pet.equipped.len() != before;
        }

        let active_is_premium = match self.active_pet() {
            Some(pet) => pet.kind.requires_premium(),
            None => true,
        };
        if active_is_premium {
            let fallback = match self.pets.iter().find(|p| !p.kind.requires_premium()) {
                Some(free) => free.id,
                None => {
                    let cat = Pet::new(PetKind::Cat.display_name(), PetKind::Cat, now);
                    let id = cat.id;
                    warn!("Premium lapsed with only premium pets, adopting a base cat");
                    self.pets.insert(0, cat);
                    id
                }
            };
            self.active = Some(fallback);
            changed = true;
        }

        changed
    }
}
