//! Monster Parser
//!
//! Stat blocks are mostly structured: each `<monster>` carries its combat
//! numbers as short formatted strings (`"17 (natural armor)"`,
//! `"135 (18d10+36)"`, `"walk 40 ft., fly 80 ft. (hover)"`) which are split
//! into typed fields here. Traits, actions, reactions and legendary actions
//! keep their prose, with `<attack>` lines decoded into [`AttackData`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::common::{entity_name, split_list, EntityParser};
use crate::ingestion::concerns::source_citations::{extract_citations, SourceCitation};
use crate::ingestion::concerns::vocabulary::ability_code;
use crate::ingestion::xml::{leading_int, Element};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpeeds {
    pub walk: u32,
    pub fly: Option<u32>,
    pub swim: Option<u32>,
    pub burrow: Option<u32>,
    pub climb: Option<u32>,
    pub can_hover: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveBonus {
    /// Ability code ("DEX")
    pub ability: String,
    pub bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBonus {
    pub skill: String,
    pub bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sense {
    /// darkvision, blindsight, tremorsense or truesight
    pub sense_type: String,
    pub range: u32,
    /// "blind beyond this radius"
    pub is_limited: bool,
    pub notes: Option<String>,
}

/// One `<attack>` line: `"Bludgeoning Damage|+9|2d6+5"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackData {
    pub name: String,
    pub attack_bonus: Option<i32>,
    pub damage_dice: Option<String>,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Trait,
    Action,
    Reaction,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAction {
    pub action_type: ActionType,
    pub name: String,
    pub description: String,
    pub attacks: Vec<AttackData>,
    /// "3/DAY", "5-6"
    pub recharge: Option<String>,
    /// "lair" for lair actions listed among legendary actions
    pub category: Option<String>,
    pub sort_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub name: String,
    pub sort_name: Option<String>,
    pub size_code: String,
    pub creature_type: String,
    pub alignment: Option<String>,
    pub is_npc: bool,
    pub armor_class: u32,
    pub armor_type: Option<String>,
    pub hit_points: u32,
    pub hit_dice: Option<String>,
    pub speeds: MonsterSpeeds,
    pub ability_scores: AbilityScores,
    pub challenge_rating: String,
    pub experience_points: u32,
    pub saving_throws: Vec<SaveBonus>,
    pub skills: Vec<SkillBonus>,
    pub damage_vulnerabilities: Option<String>,
    pub damage_resistances: Option<String>,
    pub damage_immunities: Option<String>,
    pub condition_immunities: Option<String>,
    pub senses_raw: Option<String>,
    pub senses: Vec<Sense>,
    pub passive_perception: Option<u32>,
    pub languages: Option<String>,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub sources: Vec<SourceCitation>,
    pub traits: Vec<MonsterAction>,
    pub actions: Vec<MonsterAction>,
    pub reactions: Vec<MonsterAction>,
    pub legendary: Vec<MonsterAction>,
    pub slots: Option<String>,
    pub spells: Vec<String>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("Failed to compile parenthetical regex"));

static SPEED_MODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w+)\s+(\d+)\s*ft").expect("Failed to compile speed mode regex")
});

static SIGNED_BONUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z\s]*?)\s*([+\-]\d+)").expect("Failed to compile bonus regex")
});

static SENSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(darkvision|blindsight|tremorsense|truesight)\s+(\d+)\s*ft\.?(?:\s+or\s+\d+\s*ft\.?\s+while\s+(\w+))?\s*(?:\(([^)]+)\))?",
    )
    .expect("Failed to compile sense regex")
});

/// "Fire Breath (Recharge 5-6)", "Shapechanger (3/Day)"
static NAME_RECHARGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((?:recharge\s+)?(\d(?:[-–]\d)?|\d+/(?:day|turn))\)\s*$")
        .expect("Failed to compile recharge regex")
});

/// Challenge rating to experience points, CR 0 through 30.
const XP_TABLE: &[(&str, u32)] = &[
    ("0", 10),
    ("1/8", 25),
    ("1/4", 50),
    ("1/2", 100),
    ("1", 200),
    ("2", 450),
    ("3", 700),
    ("4", 1100),
    ("5", 1800),
    ("6", 2300),
    ("7", 2900),
    ("8", 3900),
    ("9", 5000),
    ("10", 5900),
    ("11", 7200),
    ("12", 8400),
    ("13", 10000),
    ("14", 11500),
    ("15", 13000),
    ("16", 15000),
    ("17", 18000),
    ("18", 20000),
    ("19", 22000),
    ("20", 25000),
    ("21", 33000),
    ("22", 41000),
    ("23", 50000),
    ("24", 62000),
    ("25", 75000),
    ("26", 90000),
    ("27", 105000),
    ("28", 120000),
    ("29", 135000),
    ("30", 155000),
];

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct MonsterParser;

impl MonsterParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_monster(&self, element: &Element) -> Option<MonsterRecord> {
        let name = entity_name(element)?;
        let optional = |tag: &str| element.child_text(tag).map(str::to_string);

        let ac = element.child_text_or_empty("ac");
        let hp = element.child_text_or_empty("hp");
        let (description, sources) = match element.child_text("description") {
            Some(text) => {
                let extraction = extract_citations(text);
                let cleaned = Some(extraction.cleaned).filter(|d| !d.is_empty());
                (cleaned, extraction.citations)
            }
            None => (None, Vec::new()),
        };
        let challenge_rating = element.child_text_or_empty("cr").to_string();

        let record = MonsterRecord {
            sort_name: optional("sortname"),
            size_code: element.child_text_or_empty("size").to_string(),
            creature_type: element.child_text_or_empty("type").to_string(),
            alignment: optional("alignment"),
            is_npc: element.child_is_yes("npc"),
            armor_class: leading_number(ac),
            armor_type: parenthetical(ac),
            hit_points: leading_number(hp),
            hit_dice: parenthetical(hp),
            speeds: parse_speeds(element.child_text_or_empty("speed")),
            ability_scores: AbilityScores {
                strength: element.child_int("str").unwrap_or(0),
                dexterity: element.child_int("dex").unwrap_or(0),
                constitution: element.child_int("con").unwrap_or(0),
                intelligence: element.child_int("int").unwrap_or(0),
                wisdom: element.child_int("wis").unwrap_or(0),
                charisma: element.child_int("cha").unwrap_or(0),
            },
            experience_points: experience_points(&challenge_rating),
            challenge_rating,
            saving_throws: parse_saving_throws(element.child_text_or_empty("save")),
            skills: parse_skills(element.child_text_or_empty("skill")),
            damage_vulnerabilities: optional("vulnerable"),
            damage_resistances: optional("resist"),
            damage_immunities: optional("immune"),
            condition_immunities: optional("conditionImmune"),
            senses: parse_senses(element.child_text_or_empty("senses")),
            senses_raw: optional("senses"),
            passive_perception: element
                .child_int("passive")
                .and_then(|p| u32::try_from(p).ok()),
            languages: optional("languages"),
            description,
            environment: optional("environment"),
            sources,
            traits: parse_actions(element, "trait", ActionType::Trait),
            actions: parse_actions(element, "action", ActionType::Action),
            reactions: parse_actions(element, "reaction", ActionType::Reaction),
            legendary: parse_actions(element, "legendary", ActionType::Legendary),
            slots: optional("slots"),
            spells: element.child_text("spells").map(split_list).unwrap_or_default(),
            name,
        };

        tracing::debug!(
            monster = %record.name,
            cr = %record.challenge_rating,
            actions = record.actions.len(),
            "Parsed monster"
        );
        Some(record)
    }
}

impl EntityParser for MonsterParser {
    type Record = MonsterRecord;
    const ELEMENT: &'static str = "monster";

    fn parse_element(&self, element: &Element) -> Option<MonsterRecord> {
        self.parse_monster(element)
    }
}

// ============================================================================
// Field Parsers
// ============================================================================

/// "17 (natural armor)" -> 17; anything unparsable is 0.
fn leading_number(text: &str) -> u32 {
    leading_int(text)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

fn parenthetical(text: &str) -> Option<String> {
    PARENTHETICAL
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// "walk 20 ft., fly 50 ft. (hover), swim 30 ft."
pub fn parse_speeds(text: &str) -> MonsterSpeeds {
    let mut speeds = MonsterSpeeds::default();
    for caps in SPEED_MODE.captures_iter(text) {
        let Ok(value) = caps[2].parse::<u32>() else {
            continue;
        };
        match caps[1].to_lowercase().as_str() {
            "walk" => speeds.walk = value,
            "fly" => speeds.fly = Some(value),
            "swim" => speeds.swim = Some(value),
            "burrow" => speeds.burrow = Some(value),
            "climb" => speeds.climb = Some(value),
            _ => {}
        }
    }
    speeds.can_hover = text.to_lowercase().contains("hover");
    speeds
}

/// "Dex +7, Con +16" -> [(DEX, 7), (CON, 16)]
pub fn parse_saving_throws(text: &str) -> Vec<SaveBonus> {
    text.split(',')
        .filter_map(|part| SIGNED_BONUS.captures(part))
        .filter_map(|caps| {
            let name = caps[1].trim();
            let ability = ability_code(name)
                .map(str::to_string)
                .unwrap_or_else(|| name.chars().take(3).collect::<String>().to_uppercase());
            Some(SaveBonus {
                ability,
                bonus: caps[2].parse().ok()?,
            })
        })
        .collect()
}

/// "Animal Handling +5, Sleight of Hand +8"
pub fn parse_skills(text: &str) -> Vec<SkillBonus> {
    text.split(',')
        .filter_map(|part| SIGNED_BONUS.captures(part))
        .filter_map(|caps| {
            Some(SkillBonus {
                skill: caps[1].trim().to_string(),
                bonus: caps[2].parse().ok()?,
            })
        })
        .collect()
}

/// "blindsight 30 ft. or 10 ft. while deafened (blind beyond this radius), darkvision 120 ft."
pub fn parse_senses(text: &str) -> Vec<Sense> {
    SENSE
        .captures_iter(text)
        .filter_map(|caps| {
            let range = caps[2].parse().ok()?;
            let reduced_while = caps.get(3).map(|m| m.as_str());
            let notes = caps.get(4).map(|m| m.as_str().trim());
            Some(Sense {
                sense_type: caps[1].to_lowercase(),
                range,
                is_limited: notes
                    .map(|n| n.to_lowercase().contains("blind beyond"))
                    .unwrap_or(false),
                notes: match (reduced_while, notes) {
                    (Some(condition), Some(notes)) => {
                        Some(format!("or reduced while {condition}, {notes}"))
                    }
                    (_, notes) => notes.map(str::to_string),
                },
            })
        })
        .collect()
}

/// XP for a challenge rating; 0 for anything off the table.
pub fn experience_points(challenge_rating: &str) -> u32 {
    let cr = challenge_rating.trim();
    XP_TABLE
        .iter()
        .find(|(rating, _)| *rating == cr)
        .map(|(_, xp)| *xp)
        .unwrap_or(0)
}

pub fn parse_attack(raw: &str) -> AttackData {
    let mut parts = raw.split('|').map(str::trim);
    let name = parts.next().unwrap_or_default().to_string();
    let attack_bonus = parts
        .next()
        .filter(|b| !b.is_empty())
        .and_then(|b| b.trim_start_matches('+').parse().ok());
    let damage_dice = parts
        .next()
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    AttackData {
        name,
        attack_bonus,
        damage_dice,
        raw: raw.trim().to_string(),
    }
}

/// Every child named `tag`, numbered in document order.
fn parse_actions(element: &Element, tag: &str, action_type: ActionType) -> Vec<MonsterAction> {
    element
        .children_named(tag)
        .enumerate()
        .map(|(index, action)| {
            let name = action.child_text_or_empty("name").to_string();
            let recharge = action.child_text("recharge").map(str::to_string).or_else(|| {
                NAME_RECHARGE
                    .captures(&name)
                    .map(|caps| caps[1].replace('–', "-").to_uppercase())
            });
            MonsterAction {
                action_type,
                description: action
                    .children_named("text")
                    .map(Element::text)
                    .collect::<Vec<_>>()
                    .join("\n")
                    .trim()
                    .to_string(),
                attacks: action.texts_of("attack").iter().map(|a| parse_attack(a)).collect(),
                recharge,
                category: action
                    .attr("category")
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
                sort_order: index as u32,
                name,
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
