//! Natural Weapons
//!
//! Claws, talons, horns and bites granted by species traits. A trait counts as
//! a natural weapon when its text talks about unarmed strikes or natural
//! weapons and states the damage dealt.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::ability_code;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalWeapon {
    pub name: String,
    pub damage_dice: String,
    pub damage_type: String,
    /// STR, DEX or CON when the text names the ability used
    pub ability: Option<String>,
}

static WEAPON_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)unarmed\s+strikes?|natural\s+weapons?")
        .expect("Failed to compile natural weapon context regex")
});

/// "deal(s) 1d4 slashing damage", optionally "+ your Strength modifier"
static DICE_THEN_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdeals?\s+(\d+d\d+)\s+([a-z]+)\s+damage(?:\s*\+\s*your\s+([a-z]+)\s+modifier)?")
        .expect("Failed to compile dice-then-type regex")
});

/// "deal piercing damage equal to 1d4 + your Strength modifier"
static TYPE_EQUAL_TO_DICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bdeals?\s+([a-z]+)\s+damage\s+equal\s+to\s+(\d+d\d+)(?:\s*\+\s*your\s+([a-z]+)\s+modifier)?",
    )
    .expect("Failed to compile type-equal-to-dice regex")
});

/// "add your Constitution modifier, instead of your Strength modifier"
static ABILITY_SUBSTITUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\badd\s+your\s+([a-z]+)\s+modifier,?\s+instead\s+of\s+your\s+[a-z]+\s+modifier")
        .expect("Failed to compile ability substitution regex")
});

const WEAPON_ABILITIES: &[&str] = &["STR", "DEX", "CON"];

/// Parse a natural weapon from a trait's name and text.
pub fn parse_natural_weapon(trait_name: &str, text: &str) -> Option<NaturalWeapon> {
    if !WEAPON_CONTEXT.is_match(text) {
        return None;
    }

    let (damage_dice, damage_type, mut ability) =
        if let Some(caps) = TYPE_EQUAL_TO_DICE.captures(text) {
            (
                caps[2].to_string(),
                caps[1].to_lowercase(),
                caps.get(3).and_then(|m| weapon_ability(m.as_str())),
            )
        } else {
            let caps = DICE_THEN_TYPE.captures(text)?;
            (
                caps[1].to_string(),
                caps[2].to_lowercase(),
                caps.get(3).and_then(|m| weapon_ability(m.as_str())),
            )
        };

    if let Some(caps) = ABILITY_SUBSTITUTION.captures(text) {
        ability = weapon_ability(&caps[1]).or(ability);
    }

    Some(NaturalWeapon {
        name: trait_name.trim().to_string(),
        damage_dice,
        damage_type,
        ability,
    })
}

fn weapon_ability(name: &str) -> Option<String> {
    ability_code(name)
        .filter(|code| WEAPON_ABILITIES.contains(code))
        .map(str::to_string)
}
