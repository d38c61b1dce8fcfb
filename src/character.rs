use serde::{Deserialize, Serialize};

/// Armor bonus assumed from worn equipment. The sheet is laid out for a
/// shield-carrying martial character, so AC is always 10 + DEX + 2.
pub const EQUIPMENT_AC_BONUS: i32 = 2;
pub const BASE_ARMOR_CLASS: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub species_id: Option<u32>,
    #[serde(default)]
    pub class_id: Option<u32>,
    pub current_hp: i32,
    pub max_hp: i32,
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

fn default_level() -> u32 {
    1
}

impl CharacterRecord {
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set_score(&mut self, ability: Ability, score: i32) {
        let slot = match ability {
            Ability::Strength => &mut self.strength,
            Ability::Dexterity => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom => &mut self.wisdom,
            Ability::Charisma => &mut self.charisma,
        };
        *slot = score;
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.score(ability))
    }

    pub fn armor_class(&self) -> i32 {
        armor_class(self.dexterity)
    }

    pub fn initiative(&self) -> i32 {
        self.modifier(Ability::Dexterity)
    }

    pub fn proficiency_bonus(&self) -> i32 {
        proficiency_bonus(self.level)
    }
}

/// Entry of `GET /api/classes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub hit_die: Option<u32>,
    #[serde(default)]
    pub primary_ability: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    pub fn index(self) -> usize {
        match self {
            Ability::Strength => 0,
            Ability::Dexterity => 1,
            Ability::Constitution => 2,
            Ability::Intelligence => 3,
            Ability::Wisdom => 4,
            Ability::Charisma => 5,
        }
    }

    /// Field name in the backend payload.
    pub fn key(self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    pub fn short_code(self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn from_short_code(code: &str) -> Option<Ability> {
        let code = code.trim();
        Ability::ALL
            .into_iter()
            .find(|a| a.short_code().eq_ignore_ascii_case(code))
    }
}

/// Floored: a score of 9 gives -1, not 0.
pub fn ability_modifier(score: i32) -> i32 {
    // Any i32 score halves back into i32 range.
    (i64::from(score) - 10).div_euclid(2) as i32
}

pub fn format_modifier(modifier: i32) -> String {
    format!("{modifier:+}")
}

pub fn armor_class(dexterity: i32) -> i32 {
    BASE_ARMOR_CLASS
        .saturating_add(ability_modifier(dexterity))
        .saturating_add(EQUIPMENT_AC_BONUS)
}

pub fn proficiency_bonus(level: u32) -> i32 {
    2 + ((level.max(1) - 1) / 4) as i32
}
