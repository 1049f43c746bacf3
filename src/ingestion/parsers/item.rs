//! Item Parser
//!
//! One [`ItemRecord`] per `<item>` element. Structured fields (type code,
//! value, weight, damage, range, AC) come straight from child elements; the
//! rest is read from the joined `<text>` blocks through the shared concerns:
//! charges, granted spells, saving throws, proficiencies, modifiers stated in
//! prose and the contents of equipment packs.
//!
//! Spell scrolls and potions get extra type-specific fields (`spell_level`,
//! `potion`), filled only when the item is of that kind.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::common::{entity_name, EntityParser};
use crate::ingestion::concerns::charges::{parse_charges, ChargesMax};
use crate::ingestion::concerns::item_proficiencies::{parse_item_proficiencies, ItemProficiency};
use crate::ingestion::concerns::item_spells::{parse_item_spells, ItemSpell};
use crate::ingestion::concerns::modifiers::{
    parse_modifier_elements, parse_resistance_modifiers, parse_set_score_modifiers,
    stealth_disadvantage, strength_speed_penalty, Modifier, ModifierCategory,
};
use crate::ingestion::concerns::pack_contents::{parse_pack_contents, PackContentsItem};
use crate::ingestion::concerns::rest_timing::ResetTiming;
use crate::ingestion::concerns::saving_throws::{parse_item_saving_throws, SavingThrowSpec};
use crate::ingestion::concerns::source_citations::{extract_citations, SourceCitation};
use crate::ingestion::xml::Element;

/// Rarities, longest first so "very rare" is not read as "rare".
const RARITIES: &[&str] = &["very rare", "legendary", "artifact", "uncommon", "rare", "common"];

const POTION_TYPE: &str = "P";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAbility {
    pub ability_type: String,
    pub name: String,
    pub description: String,
    pub roll_formula: Option<String>,
    pub sort_order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotionCategory {
    Healing,
    Resistance,
    Buff,
    Debuff,
    Utility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotionEffect {
    pub category: PotionCategory,
    /// "1 hour", "10 minutes"
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    pub type_code: String,
    pub detail: Option<String>,
    pub rarity: String,
    pub requires_attunement: bool,
    pub is_magic: bool,
    pub cost_cp: Option<u64>,
    pub weight: Option<f64>,
    pub damage_dice: Option<String>,
    pub versatile_damage: Option<String>,
    pub damage_type_code: Option<String>,
    pub range_normal: Option<u32>,
    pub range_long: Option<u32>,
    pub armor_class: Option<i32>,
    pub strength_requirement: Option<i32>,
    pub stealth_disadvantage: bool,
    pub description: String,
    pub properties: Vec<String>,
    pub sources: Vec<SourceCitation>,
    pub proficiencies: Vec<ItemProficiency>,
    pub modifiers: Vec<Modifier>,
    pub abilities: Vec<ItemAbility>,
    pub charges_max: Option<ChargesMax>,
    pub recharge_formula: Option<String>,
    pub recharge_timing: Option<ResetTiming>,
    pub spells: Vec<ItemSpell>,
    pub saving_throws: Vec<SavingThrowSpec>,
    pub contents: Vec<PackContentsItem>,
    /// Spell scrolls: 0 for a cantrip scroll, 1-9 otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spell_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potion: Option<PotionEffect>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static ROLL_FORMULA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+d\d+(?:\s*[+\-]\s*\d+)?)").expect("Failed to compile roll formula regex")
});

static SCROLL_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Spell Scroll\s*\((?:(\d+)(?:st|nd|rd|th)\s+Level|(Cantrip))\)")
        .expect("Failed to compile scroll level regex")
});

static POTION_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfor\s+(\d+\s+(?:minute|hour)s?)\b").expect("Failed to compile potion duration regex")
});

static REGAIN_HIT_POINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bregain\s+\d+d\d+").expect("Failed to compile regain hit points regex")
});

const BUFF_WORDS: &[&str] = &[
    "heroism",
    "giant strength",
    "clairvoyance",
    "mind reading",
    "invulnerability",
    "speed",
    "vitality",
    "temporary hit points",
    "score becomes",
    "advantage on",
];

const DEBUFF_WORDS: &[&str] = &["poison", "delusion"];

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ItemParser;

impl ItemParser {
    pub fn new() -> Self {
        Self
    }
}

impl EntityParser for ItemParser {
    type Record = ItemRecord;
    const ELEMENT: &'static str = "item";

    fn parse_element(&self, element: &Element) -> Option<ItemRecord> {
        let name = entity_name(element)?;
        let text = element
            .children_named("text")
            .map(|t| t.text())
            .collect::<Vec<_>>()
            .join("\n\n");
        let detail = element.child_text("detail").map(str::to_string);
        let detail_str = detail.as_deref().unwrap_or("");
        let type_code = element.child_text_or_empty("type").to_string();
        let (range_normal, range_long) = parse_range(element.child_text_or_empty("range"));
        let charges = parse_charges(&text).unwrap_or_default();
        let stealth = element.child_is_yes("stealth");
        let strength_requirement = element.child_int("strength");
        let modifiers = parse_item_modifiers(element, stealth, strength_requirement);

        let potion = if type_code == POTION_TYPE {
            Some(categorize_potion(&name, &text, &modifiers))
        } else {
            None
        };
        let spell_level = scroll_level(&name);
        if spell_level.is_none() && name.starts_with("Spell Scroll") {
            tracing::warn!(item = %name, "Could not extract spell level from scroll name");
        }

        tracing::debug!(item = %name, modifiers = modifiers.len(), "Parsed item");

        Some(ItemRecord {
            rarity: parse_rarity(detail_str).to_string(),
            requires_attunement: detail_str.to_lowercase().contains("requires attunement")
                || text.to_lowercase().contains("requires attunement"),
            is_magic: element.child_is_yes("magic"),
            cost_cp: element.child_text("value").and_then(parse_cost),
            weight: element.child_text("weight").and_then(|w| w.parse().ok()),
            damage_dice: element.child_text("dmg1").map(str::to_string),
            versatile_damage: element.child_text("dmg2").map(str::to_string),
            damage_type_code: element.child_text("dmgType").map(str::to_string),
            range_normal,
            range_long,
            armor_class: element.child_int("ac"),
            strength_requirement,
            stealth_disadvantage: stealth,
            properties: element
                .child_text("property")
                .map(|p| p.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            sources: extract_citations(&text).citations,
            proficiencies: parse_item_proficiencies(&text),
            modifiers,
            abilities: parse_abilities(element),
            charges_max: charges.charges_max,
            recharge_formula: charges.recharge_formula,
            recharge_timing: charges.recharge_timing,
            spells: parse_item_spells(&text),
            saving_throws: parse_item_saving_throws(&text),
            contents: parse_pack_contents(&text),
            spell_level,
            potion,
            description: text,
            detail,
            type_code,
            name,
        })
    }
}

// ============================================================================
// Fields
// ============================================================================

pub fn parse_rarity(detail: &str) -> &'static str {
    let lower = detail.to_lowercase();
    RARITIES
        .iter()
        .copied()
        .find(|r| lower.contains(r))
        .unwrap_or("common")
}

/// Gold pieces to copper pieces.
pub fn parse_cost(value: &str) -> Option<u64> {
    let gp: f64 = value.trim().parse().ok()?;
    if gp < 0.0 {
        return None;
    }
    Some((gp * 100.0).round() as u64)
}

/// "80/320" -> (80, 320); "30" -> (30, None)
pub fn parse_range(raw: &str) -> (Option<u32>, Option<u32>) {
    match raw.split_once('/') {
        Some((normal, long)) => (normal.trim().parse().ok(), long.trim().parse().ok()),
        None => (raw.trim().parse().ok(), None),
    }
}

fn parse_item_modifiers(element: &Element, stealth: bool, strength: Option<i32>) -> Vec<Modifier> {
    let first_text = element.child_text_or_empty("text");
    let mut modifiers = parse_modifier_elements(element);

    if stealth {
        modifiers.push(stealth_disadvantage());
    }
    if let Some(penalty) = strength.and_then(|s| strength_speed_penalty(s, first_text)) {
        modifiers.push(penalty);
    }
    modifiers.extend(parse_set_score_modifiers(first_text));
    modifiers.extend(parse_resistance_modifiers(first_text));
    modifiers
}

fn parse_abilities(element: &Element) -> Vec<ItemAbility> {
    element
        .children_named("roll")
        .enumerate()
        .map(|(i, roll)| {
            let roll_text = roll.text().to_string();
            let name = roll
                .attr("description")
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| roll_text.clone());
            ItemAbility {
                ability_type: "roll".to_string(),
                name,
                roll_formula: ROLL_FORMULA.captures(&roll_text).map(|c| c[1].to_string()),
                description: roll_text,
                sort_order: i as u32,
            }
        })
        .collect()
}

/// Spell level from "Spell Scroll (3rd Level)" or "Spell Scroll (Cantrip)".
pub fn scroll_level(name: &str) -> Option<u32> {
    let caps = SCROLL_LEVEL.captures(name)?;
    match caps.get(1) {
        Some(level) => level.as_str().parse().ok(),
        None => Some(0),
    }
}

pub fn categorize_potion(name: &str, description: &str, modifiers: &[Modifier]) -> PotionEffect {
    let name_lower = name.to_lowercase();
    let haystack = format!("{} {}", name_lower, description.to_lowercase());

    let resists_one_type = modifiers.iter().any(|m| {
        m.category == ModifierCategory::DamageResistance && m.damage_type_name.is_some()
    });

    let category = if name_lower.contains("healing")
        || name_lower.contains("health")
        || REGAIN_HIT_POINTS.is_match(description)
    {
        PotionCategory::Healing
    } else if resists_one_type || name_lower.contains("resistance") {
        PotionCategory::Resistance
    } else if DEBUFF_WORDS.iter().any(|w| name_lower.contains(w)) {
        PotionCategory::Debuff
    } else if BUFF_WORDS.iter().any(|w| haystack.contains(w)) {
        PotionCategory::Buff
    } else {
        PotionCategory::Utility
    };

    PotionEffect {
        category,
        duration: POTION_DURATION.captures(description).map(|c| c[1].to_lowercase()),
    }
}
