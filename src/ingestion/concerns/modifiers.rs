//! Modifier Parsing
//!
//! Turns `<modifier category="...">name +N</modifier>` elements into typed
//! modifiers, and recognizes the few modifiers items only state in prose:
//! fixed ability scores ("Your Strength score is 19 while..."), damage
//! resistance potions, stealth disadvantage and heavy-armor speed penalties.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::concerns::modifiers::{parse_modifier_text, ModifierCategory};
//!
//! let modifier = parse_modifier_text("Spell Attack +1", "bonus").unwrap();
//! assert_eq!(modifier.category, ModifierCategory::SpellAttack);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::{ability_code, title_case, ABILITIES, SKILLS};
use crate::ingestion::xml::Element;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierCategory {
    SavingThrow,
    SpellAttack,
    SpellDc,
    AcMagic,
    Ac,
    Initiative,
    MeleeAttack,
    MeleeDamage,
    RangedAttack,
    RangedDamage,
    WeaponAttack,
    WeaponDamage,
    AttackBonus,
    DamageBonus,
    AbilityScore,
    Skill,
    Speed,
    DamageResistance,
    Bonus,
}

/// Numeric bonus, or a notation such as `"set:19"`, `"disadvantage"`, `"resistance:all"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModifierValue {
    Amount(i32),
    Notation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub category: ModifierCategory,
    pub value: ModifierValue,
    pub ability_score_code: Option<String>,
    pub skill_name: Option<String>,
    pub damage_type_name: Option<String>,
    pub condition: Option<String>,
}

impl Modifier {
    fn new(category: ModifierCategory, value: ModifierValue) -> Self {
        Self {
            category,
            value,
            ability_score_code: None,
            skill_name: None,
            damage_type_name: None,
            condition: None,
        }
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

static TARGET_AND_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\w\s]+)\s*([+\-]\d+)").expect("Failed to compile modifier text regex")
});

static SET_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Your\s+(\w+)\s+score\s+is\s+(\d+)\s+(while\s+[^.]+)")
        .expect("Failed to compile set score regex")
});

static RESIST_ALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+(?:gain|have)\s+resistance\s+to\s+all\s+damage")
        .expect("Failed to compile resist-all regex")
});

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(for\s+\d+\s+(?:minute|hour)s?)").expect("Failed to compile duration regex")
});

static RESIST_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+(?:gain|have)\s+resistance\s+to\s+(\w+)\s+damage[^.]*?(for\s+[^.]+)")
        .expect("Failed to compile resistance regex")
});

static SKILL_ADVANTAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)advantage\s+on\s+(\w+)\s*\(([^)]+)\)(?:\s+and\s+(\w+)\s*\(([^)]+)\))?\s+checks?(?:\s+((?:made\s+)?(?:to|when|against)\s+[^.]+))?",
    )
    .expect("Failed to compile skill advantage regex")
});

static SPEED_REDUCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)speed\s+is\s+reduced\s+by\s+(\d+)\s+feet")
        .expect("Failed to compile speed reduction regex")
});

// ============================================================================
// Element Modifiers
// ============================================================================

/// Parse every `<modifier>` child of an element, skipping unparseable ones.
pub fn parse_modifier_elements(element: &Element) -> Vec<Modifier> {
    element
        .children_named("modifier")
        .filter_map(|m| parse_modifier_text(m.text(), m.attr("category").unwrap_or("bonus")))
        .collect()
}

/// Parse "target +N" modifier text under the XML `category` attribute.
pub fn parse_modifier_text(text: &str, xml_category: &str) -> Option<Modifier> {
    let lower = text.to_lowercase();
    let caps = TARGET_AND_VALUE.captures(&lower)?;
    let target = caps[1].trim().to_string();
    let value: i32 = caps[2].parse().ok()?;
    let xml_category = xml_category.trim().to_lowercase();

    let is_ac = target == "ac" || target == "armor class";
    let category = if target.contains("saving throw") {
        ModifierCategory::SavingThrow
    } else if target.contains("spell attack") {
        ModifierCategory::SpellAttack
    } else if target.contains("spell dc") {
        ModifierCategory::SpellDc
    } else if is_ac && xml_category == "bonus" {
        ModifierCategory::AcMagic
    } else if is_ac {
        ModifierCategory::Ac
    } else if target.contains("initiative") {
        ModifierCategory::Initiative
    } else if target.contains("melee attack") {
        ModifierCategory::MeleeAttack
    } else if target.contains("melee damage") {
        ModifierCategory::MeleeDamage
    } else if target.contains("ranged attack") {
        ModifierCategory::RangedAttack
    } else if target.contains("ranged damage") {
        ModifierCategory::RangedDamage
    } else if target.contains("weapon attack") {
        ModifierCategory::WeaponAttack
    } else if target.contains("weapon damage") {
        ModifierCategory::WeaponDamage
    } else if target.contains("attack") {
        ModifierCategory::AttackBonus
    } else if target.contains("damage") {
        ModifierCategory::DamageBonus
    } else if xml_category == "ability score" {
        ModifierCategory::AbilityScore
    } else if xml_category == "skill" {
        ModifierCategory::Skill
    } else {
        ModifierCategory::Bonus
    };

    let mut modifier = Modifier::new(category, ModifierValue::Amount(value));
    match category {
        ModifierCategory::AbilityScore => modifier.ability_score_code = match_ability(&target),
        ModifierCategory::Skill => modifier.skill_name = match_skill_fuzzy(&target),
        ModifierCategory::SavingThrow => modifier.ability_score_code = match_ability(&target),
        _ => {}
    }
    Some(modifier)
}

fn match_ability(target: &str) -> Option<String> {
    if let Some(code) = ability_code(target) {
        return Some(code.to_string());
    }
    ABILITIES
        .iter()
        .find(|(full, _)| target.contains(&full.to_lowercase()))
        .map(|(_, code)| code.to_string())
}

fn match_skill_fuzzy(target: &str) -> Option<String> {
    SKILLS
        .iter()
        .find(|s| target.contains(&s.to_lowercase()))
        .map(|s| s.to_string())
}

// ============================================================================
// Prose Modifiers
// ============================================================================

/// Stealth disadvantage from `<stealth>YES</stealth>`.
pub fn stealth_disadvantage() -> Modifier {
    let mut modifier = Modifier::new(
        ModifierCategory::Skill,
        ModifierValue::Notation("disadvantage".to_string()),
    );
    modifier.skill_name = Some("Stealth".to_string());
    modifier.ability_score_code = Some("DEX".to_string());
    modifier
}

/// Speed penalty for wearing armor without the required Strength.
pub fn strength_speed_penalty(strength_requirement: i32, text: &str) -> Option<Modifier> {
    let caps = SPEED_REDUCED.captures(text)?;
    let penalty: i32 = caps[1].parse().ok()?;
    let mut modifier = Modifier::new(ModifierCategory::Speed, ModifierValue::Amount(-penalty));
    modifier.condition = Some(format!("strength < {}", strength_requirement));
    Some(modifier)
}

/// "Your Intelligence score is 19 while you wear this headband."
pub fn parse_set_score_modifiers(text: &str) -> Vec<Modifier> {
    let Some(caps) = SET_SCORE.captures(text) else {
        return Vec::new();
    };
    let mut modifier = Modifier::new(
        ModifierCategory::AbilityScore,
        ModifierValue::Notation(format!("set:{}", &caps[2])),
    );
    modifier.ability_score_code = ability_code(&caps[1]).map(str::to_string);
    modifier.condition = Some(caps[3].trim().to_string());
    vec![modifier]
}

/// Damage resistance granted by the item's text, typed or against all damage.
pub fn parse_resistance_modifiers(text: &str) -> Vec<Modifier> {
    if RESIST_ALL.is_match(text) {
        let mut modifier = Modifier::new(
            ModifierCategory::DamageResistance,
            ModifierValue::Notation("resistance:all".to_string()),
        );
        modifier.condition = DURATION
            .captures(text)
            .map(|caps| caps[1].trim().to_lowercase());
        return vec![modifier];
    }

    let Some(caps) = RESIST_TYPE.captures(text) else {
        return Vec::new();
    };
    let mut modifier = Modifier::new(
        ModifierCategory::DamageResistance,
        ModifierValue::Notation("resistance".to_string()),
    );
    modifier.damage_type_name = Some(title_case(&caps[1].to_lowercase()));
    modifier.condition = Some(caps[2].trim().to_string());
    vec![modifier]
}

// ============================================================================
// Tests
// ============================================================================

/// "advantage on Charisma (Deception) and Charisma (Performance) checks made to
/// pass yourself off as a different person"
pub fn parse_skill_advantages(text: &str) -> Vec<Modifier> {
    let mut modifiers = Vec::new();
    for caps in SKILL_ADVANTAGE.captures_iter(text) {
        let condition = caps.get(5).map(|m| m.as_str().trim().to_string());
        for (ability, skill) in [(caps.get(1), caps.get(2)), (caps.get(3), caps.get(4))] {
            let (Some(ability), Some(skill)) = (ability, skill) else {
                continue;
            };
            let mut modifier = Modifier::new(
                ModifierCategory::Skill,
                ModifierValue::Notation("advantage".to_string()),
            );
            modifier.ability_score_code = ability_code(ability.as_str()).map(str::to_string);
            modifier.skill_name = Some(skill.as_str().trim().to_string());
            modifier.condition = condition.clone();
            modifiers.push(modifier);
        }
    }
    modifiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Saving Throw +1", "bonus", ModifierCategory::SavingThrow)]
    #[case("spell attack +2", "bonus", ModifierCategory::SpellAttack)]
    #[case("Spell DC +1", "bonus", ModifierCategory::SpellDc)]
    #[case("ac +1", "bonus", ModifierCategory::AcMagic)]
    #[case("AC +2", "", ModifierCategory::Ac)]
    #[case("initiative +5", "bonus", ModifierCategory::Initiative)]
    #[case("melee attacks +1", "bonus", ModifierCategory::MeleeAttack)]
    #[case("ranged damage +2", "bonus", ModifierCategory::RangedDamage)]
    #[case("weapon attack +3", "bonus", ModifierCategory::WeaponAttack)]
    #[case("attack +1", "bonus", ModifierCategory::AttackBonus)]
    #[case("damage +1", "bonus", ModifierCategory::DamageBonus)]
    #[case("dexterity +1", "ability score", ModifierCategory::AbilityScore)]
    #[case("acrobatics +2", "skill", ModifierCategory::Skill)]
    #[case("speed +10", "bonus", ModifierCategory::Bonus)]
    fn test_categories(#[case] text: &str, #[case] xml: &str, #[case] expected: ModifierCategory) {
        assert_eq!(parse_modifier_text(text, xml).unwrap().category, expected);
    }

    #[test]
    fn test_acrobatics_is_not_ac() {
        let modifier = parse_modifier_text("Acrobatics +2", "bonus").unwrap();
        assert_eq!(modifier.category, ModifierCategory::Bonus);
    }

    #[test]
    fn test_ability_and_skill_matching() {
        let ability = parse_modifier_text("Strength +2", "ability score").unwrap();
        assert_eq!(ability.ability_score_code.as_deref(), Some("STR"));
        assert_eq!(ability.value, ModifierValue::Amount(2));

        let skill = parse_modifier_text("Sleight of Hand +1", "skill").unwrap();
        assert_eq!(skill.skill_name.as_deref(), Some("Sleight of Hand"));
    }

    #[test]
    fn test_negative_value_and_unparseable() {
        let modifier = parse_modifier_text("ac -1", "bonus").unwrap();
        assert_eq!(modifier.value, ModifierValue::Amount(-1));
        assert!(parse_modifier_text("advantage on stealth", "bonus").is_none());
    }

    #[test]
    fn test_set_score() {
        let mods = parse_set_score_modifiers(
            "Your Intelligence score is 19 while you wear this headband. It has no effect on you if your Intelligence is already 19 or higher.",
        );
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].value, ModifierValue::Notation("set:19".to_string()));
        assert_eq!(mods[0].ability_score_code.as_deref(), Some("INT"));
        assert_eq!(mods[0].condition.as_deref(), Some("while you wear this headband"));
    }

    #[test]
    fn test_resistance_all() {
        let mods = parse_resistance_modifiers(
            "For 1 minute after you drink this potion, you have resistance to all damage.",
        );
        assert_eq!(mods[0].value, ModifierValue::Notation("resistance:all".to_string()));
        assert_eq!(mods[0].condition.as_deref(), Some("for 1 minute"));
    }

    #[test]
    fn test_typed_resistance() {
        let mods = parse_resistance_modifiers(
            "When you drink this potion, you gain resistance to fire damage for 1 hour.",
        );
        assert_eq!(mods[0].damage_type_name.as_deref(), Some("Fire"));
        assert_eq!(mods[0].condition.as_deref(), Some("for 1 hour"));
    }

    #[test]
    fn test_strength_speed_penalty() {
        let modifier = strength_speed_penalty(
            15,
            "If the wearer has a Strength score lower than 15, their speed is reduced by 10 feet.",
        )
        .unwrap();
        assert_eq!(modifier.value, ModifierValue::Amount(-10));
        assert_eq!(modifier.condition.as_deref(), Some("strength < 15"));
    }

    #[test]
    fn test_value_serialization() {
        let json = serde_json::to_value(stealth_disadvantage()).unwrap();
        assert_eq!(json["value"], "disadvantage");
        assert_eq!(json["category"], "skill");
    }

    #[test]
    fn test_skill_advantages() {
        let modifiers = parse_skill_advantages(
            "You have advantage on Charisma (Deception) and Charisma (Performance) checks when trying to pass yourself off as a different person.",
        );
        assert_eq!(modifiers.len(), 2);
        assert_eq!(modifiers[0].skill_name.as_deref(), Some("Deception"));
        assert_eq!(modifiers[1].skill_name.as_deref(), Some("Performance"));
        assert_eq!(modifiers[1].ability_score_code.as_deref(), Some("CHA"));
        assert_eq!(modifiers[0].value, ModifierValue::Notation("advantage".to_string()));
        assert!(modifiers[0].condition.as_deref().unwrap().starts_with("when trying"));
    }
}
