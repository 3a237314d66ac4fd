//! Pet accessory catalog

use serde::{Deserialize, Serialize};

/// Where an accessory is worn; one equipped per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryCategory {
    Head,
    Neck,
    Chest,
}

impl AccessoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessoryCategory::Head => "head",
            AccessoryCategory::Neck => "neck",
            AccessoryCategory::Chest => "chest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "head" => Some(AccessoryCategory::Head),
            "neck" => Some(AccessoryCategory::Neck),
            "chest" => Some(AccessoryCategory::Chest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryId {
    Cap,
    Beanie,
    Sunglasses,
    Bandana,
    PartyHat,
    Crown,
    WizardHat,
    Bowtie,
    Scarf,
    Tie,
    Necklace,
    Medal,
    Badge,
    HeartPin,
}

/// Static accessory definition
#[derive(Debug, Clone)]
pub struct Accessory {
    pub id: AccessoryId,
    pub name: &'static str,
    pub icon: &'static str,
    pub category: AccessoryCategory,
    /// Pet XP needed to unlock
    pub unlock_xp: u64,
    pub is_premium: bool,
}

macro_rules! accessory {
    ($id:ident, $name:literal, $icon:literal, $cat:ident, $xp:expr, $premium:expr) => {
        Accessory {
            id: AccessoryId::$id,
            name: $name,
            icon: $icon,
            category: AccessoryCategory::$cat,
            unlock_xp: $xp,
            is_premium: $premium,
        }
    };
}

pub static ACCESSORIES: &[Accessory] = &[
    accessory!(Cap, "Baseball cap", "🧢", Head, 10_000, false),
    accessory!(Beanie, "Beanie", "🎩", Head, 25_000, false),
    accessory!(Sunglasses, "Sunglasses", "🕶️", Head, 50_000, false),
    accessory!(Bandana, "Bandana", "🤠", Head, 75_000, false),
    accessory!(PartyHat, "Party hat", "🎉", Head, 100_000, false),
    accessory!(Crown, "Golden crown", "👑", Head, 500_000, true),
    accessory!(WizardHat, "Wizard hat", "🧙", Head, 400_000, true),
    accessory!(Bowtie, "Bow tie", "🎀", Neck, 120_000, false),
    accessory!(Scarf, "Scarf", "🧣", Neck, 150_000, false),
    accessory!(Tie, "Tie", "👔", Neck, 200_000, false),
    accessory!(Necklace, "Necklace", "💎", Neck, 350_000, true),
    accessory!(Medal, "Gold medal", "🏅", Chest, 300_000, true),
    accessory!(Badge, "Battle badge", "🎖️", Chest, 450_000, true),
    accessory!(HeartPin, "Heart pin", "💖", Chest, 250_000, true),
];

impl AccessoryId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessoryId::Cap => "cap",
            AccessoryId::Beanie => "beanie",
            AccessoryId::Sunglasses => "sunglasses",
            AccessoryId::Bandana => "bandana",
            AccessoryId::PartyHat => "party_hat",
            AccessoryId::Crown => "crown",
            AccessoryId::WizardHat => "wizard_hat",
            AccessoryId::Bowtie => "bowtie",
            AccessoryId::Scarf => "scarf",
            AccessoryId::Tie => "tie",
            AccessoryId::Necklace => "necklace",
            AccessoryId::Medal => "medal",
            AccessoryId::Badge => "badge",
            AccessoryId::HeartPin => "heart_pin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        ACCESSORIES.iter().map(|a| a.id).find(|id| id.as_str() == s)
    }

    pub fn def(&self) -> &'static Accessory {
        // Every variant has exactly one catalog entry
        ACCESSORIES
            .iter()
            .find(|a| a.id == *self)
            .unwrap_or(&ACCESSORIES[0])
    }
}

impl std::fmt::Display for AccessoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accessories whose threshold `xp` meets
pub fn unlocked_at(xp: u64) -> impl Iterator<Item = &'static Accessory> {
    ACCESSORIES.iter().filter(move |a| a.unlock_xp <= xp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_complete() {
        for accessory in ACCESSORIES {
            assert_eq!(accessory.id.def().id, accessory.id);
            assert_eq!(AccessoryId::from_str(accessory.id.as_str()), Some(accessory.id));
        }
        assert_eq!(ACCESSORIES.len(), 14);
    }

    #[test]
    fn test_unlock_is_monotonic() {
        let mut previous = 0;
        for xp in [0, 10_000, 99_999, 100_000, 250_000, 500_000] {
            let count = unlocked_at(xp).count();
            assert!(count >= previous);
            previous = count;
        }
        assert_eq!(unlocked_at(9_999).count(), 0);
        assert_eq!(unlocked_at(500_000).count(), ACCESSORIES.len());
    }
}
