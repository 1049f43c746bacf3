//! Item Proficiencies
//!
//! Items either require a proficiency to use well (`Proficiency: martial
//! weapons, longsword`) or grant one while held or worn ("you have
//! proficiency with the navigator's tools").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::{is_ability_name, match_skill};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyType {
    Armor,
    Weapon,
    Tool,
    Skill,
    SavingThrow,
    Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProficiency {
    pub name: String,
    pub proficiency_type: ProficiencyType,
    /// `true` when the item grants the proficiency, `false` when it requires it
    pub grants: bool,
}

static REQUIRED_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Proficienc(?:y|ies):\s*([^\n]+)")
        .expect("Failed to compile required proficiency regex")
});

static GRANTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\byou\s+(?:have|gain)\s+proficiency\s+(?:with|in)\s+(?:the\s+)?([^.;]+?)(?:\s+while\b|\s+if\b|[.;]|$)")
        .expect("Failed to compile granted proficiency regex")
});

/// Extract required and granted proficiencies from an item description.
pub fn parse_item_proficiencies(text: &str) -> Vec<ItemProficiency> {
    let mut proficiencies = Vec::new();

    if let Some(caps) = REQUIRED_LIST.captures(text) {
        if let Some(list) = caps.get(1) {
            for name in list.as_str().split(',') {
                let name = name.trim().trim_end_matches('.').trim();
                if name.is_empty() {
                    continue;
                }
                proficiencies.push(ItemProficiency {
                    name: name.to_string(),
                    proficiency_type: infer_proficiency_type(name),
                    grants: false,
                });
            }
        }
    }

    for caps in GRANTED.captures_iter(text) {
        let Some(list) = caps.get(1) else { continue };
        for name in list.as_str().split(" and ") {
            let name = name.trim().trim_start_matches("the ").trim();
            if name.is_empty() {
                continue;
            }
            proficiencies.push(ItemProficiency {
                name: name.to_string(),
                proficiency_type: infer_proficiency_type(name),
                grants: true,
            });
        }
    }

    proficiencies
}

/// Guess the proficiency family from its name.
pub fn infer_proficiency_type(name: &str) -> ProficiencyType {
    let lower = name.to_lowercase();
    let stripped = lower.trim_end_matches(" saving throws").trim_end_matches(" saving throw");

    if lower.contains("saving throw") && is_ability_name(stripped) {
        ProficiencyType::SavingThrow
    } else if match_skill(name).is_some() || lower.ends_with(" skill") {
        ProficiencyType::Skill
    } else if lower.contains("armor") || lower.contains("armour") || lower.contains("shield") {
        ProficiencyType::Armor
    } else if lower.contains("tools")
        || lower.contains("kit")
        || lower.contains("supplies")
        || lower.contains("instrument")
        || lower.contains("gaming set")
        || lower.contains("utensils")
        || lower.contains("vehicles")
    {
        ProficiencyType::Tool
    } else if lower.contains("language") {
        ProficiencyType::Language
    } else {
        ProficiencyType::Weapon
    }
}
