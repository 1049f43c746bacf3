//! Feat Parser
//!
//! One [`FeatRecord`] per `<feat>` element. The structured parts are the
//! `<prerequisite>` line, `<proficiency>` and `<modifier>` elements; the rest
//! (granted proficiencies, advantage conditions, innate spells, languages,
//! resistances, extra hit points, passive score bonuses) is read from the
//! description text.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::parsers::{EntityParser, FeatParser};
//!
//! let feats = FeatParser::new().parse(xml)?;
//! for feat in &feats {
//!     println!("{}: {} prerequisite facts", feat.name, feat.prerequisites.len());
//! }
//! ```

pub mod prerequisites;

pub use prerequisites::{parse_prerequisites, Prerequisite, PrerequisiteType};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::common::{element_text, entity_name, EntityParser};
use crate::ingestion::concerns::modifiers::{
    parse_modifier_text, parse_skill_advantages, Modifier, ModifierCategory,
};
use crate::ingestion::concerns::movement_modifiers::{parse_movement_modifiers, MovementModifier};
use crate::ingestion::concerns::resource_costs::{parse_description_cost, ResourceCost};
use crate::ingestion::concerns::rest_timing::{parse_reset_timing, ResetTiming};
use crate::ingestion::concerns::source_citations::{extract_citations, SourceCitation};
use crate::ingestion::concerns::usage_limits::{parse_usage_limit, UsageLimit};
use crate::ingestion::concerns::vocabulary::{ability_code, title_case, word_to_number};
use crate::ingestion::xml::Element;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatProficiency {
    pub description: String,
    pub is_choice: bool,
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatConditionEffect {
    Advantage,
    Disadvantage,
    NegatesDisadvantage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatCondition {
    pub effect_type: FeatConditionEffect,
    pub description: String,
}

/// A spell a feat grants, either by name or as a constrained choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatSpell {
    Fixed {
        spell_name: String,
        usage_limit: Option<ResetTiming>,
    },
    /// "one 1st-level spell of your choice ... from the illusion or necromancy school"
    SchoolChoice {
        choice_group: String,
        choice_count: u32,
        max_level: u32,
        schools: Vec<String>,
    },
    /// "two bard cantrips of your choice"
    CantripChoice {
        choice_group: String,
        choice_count: u32,
        class_name: String,
    },
    /// "one 1st-level bard spell", optionally restricted to rituals
    ClassSpellChoice {
        choice_group: String,
        choice_count: u32,
        max_level: u32,
        class_name: String,
        is_ritual_only: bool,
    },
}

impl FeatSpell {
    pub fn is_choice(&self) -> bool {
        !matches!(self, Self::Fixed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatLanguage {
    pub is_choice: bool,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatResistance {
    /// Lowercase damage type, or "all"
    pub damage_type: String,
    pub condition: Option<String>,
}

/// "+5 bonus to your passive Wisdom (Perception) and passive Intelligence (Investigation) scores"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveScoreBonus {
    pub ability_code: Option<String>,
    pub skill_name: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatRecord {
    pub name: String,
    /// The `<prerequisite>` line as written
    pub prerequisites_text: Option<String>,
    pub prerequisites: Vec<Prerequisite>,
    pub description: String,
    pub sources: Vec<SourceCitation>,
    pub modifiers: Vec<Modifier>,
    pub passive_scores: Vec<PassiveScoreBonus>,
    pub hit_points_per_level: Option<u32>,
    pub proficiencies: Vec<FeatProficiency>,
    pub conditions: Vec<FeatCondition>,
    pub spells: Vec<FeatSpell>,
    pub languages: Vec<FeatLanguage>,
    pub resistances: Vec<FeatResistance>,
    pub movement_modifiers: Vec<MovementModifier>,
    pub resets_on: Option<ResetTiming>,
    pub usage: Option<UsageLimit>,
    /// "a number of times equal to your Charisma modifier"
    pub uses_formula: Option<String>,
    pub resource_cost: Option<ResourceCost>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static PROFICIENCY_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)gain\s+proficiency\s+(?:with|in)\s+(?:any\s+combination\s+of\s+)?(one|two|three|four|five|six)\s+(.+?)\s+of\s+your\s+choice",
    )
    .expect("Failed to compile proficiency choice regex")
});

static PROFICIENCY_FIXED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)gain\s+proficiency\s+(?:with|in)\s+([^.\n]+?)\.?[ \t]*$")
        .expect("Failed to compile fixed proficiency regex")
});

static ADVANTAGE_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+have\s+advantage\s+on\s+([^.]+)")
        .expect("Failed to compile advantage regex")
});

static NO_DISADVANTAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:doesn't|doesn’t|does\s+not)\s+impose\s+disadvantage\s+on\s+([^.]+)")
        .expect("Failed to compile disadvantage negation regex")
});

static DISADVANTAGE_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+have\s+disadvantage\s+on\s+([^.]+)")
        .expect("Failed to compile disadvantage regex")
});

/// "Charisma (Deception) ... checks", covered by skill advantage modifiers
static SKILL_CHECK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+\s*\([^)]+\)").expect("Failed to compile skill check regex")
});

static LEARN_SPELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+learn\s+the\s+([a-z][a-z\s'’]+?)\s+spell")
        .expect("Failed to compile learned spell regex")
});

static SCHOOL_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(one|two|three)\s+(\d+)(?:st|nd|rd|th)-level\s+spells?\s+of\s+your\s+choice")
        .expect("Failed to compile school spell choice regex")
});

static SCHOOL_CONSTRAINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)must\s+be\s+from\s+the\s+(\w+)(?:\s+or\s+(\w+))?\s+school")
        .expect("Failed to compile school constraint regex")
});

static CANTRIP_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(one|two|three|four)\s+(\w+)\s+cantrips?\s+of\s+your\s+choice")
        .expect("Failed to compile cantrip choice regex")
});

static CLASS_SPELL_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:choose\s+)?(one|two|three)\s+(\d+)(?:st|nd|rd|th)-level\s+(\w+)\s+spells?")
        .expect("Failed to compile class spell choice regex")
});

static RITUAL_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)must\s+have\s+the\s+ritual\s+tag").expect("Failed to compile ritual regex")
});

static LANGUAGE_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+learn\s+(one|two|three|four|five|six)\s+languages?\s+of\s+your\s+choice")
        .expect("Failed to compile language choice regex")
});

static RESIST_DEALT_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+have\s+resistance\s+to\s+(?:all\s+)?(?:the\s+)?damage\s+dealt\s+by\s+([^.]+)")
        .expect("Failed to compile conditional resistance regex")
});

static RESIST_TYPES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you\s+have\s+resistance\s+to\s+([^.]+?)\s+damage")
        .expect("Failed to compile resistance regex")
});

static HIT_POINTS_PER_LEVEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)hit\s+point\s+maximum\s+increases\s+by\s+an\s+additional\s+(\d+)\s+hit\s+points?")
        .expect("Failed to compile hit point regex")
});

static PASSIVE_BONUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\+(\d+)\s+bonus\s+to\s+(?:your\s+)?passive")
        .expect("Failed to compile passive bonus regex")
});

static PASSIVE_SKILL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)passive\s+(\w+)\s*\(([^)]+)\)").expect("Failed to compile passive skill regex")
});

static USES_FORMULA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)a\s+number\s+of\s+times\s+equal\s+to\s+your\s+(\w+\s+modifier|proficiency\s+bonus)")
        .expect("Failed to compile uses formula regex")
});

// ============================================================================
// Parser
// ============================================================================

/// Parser for `<feat>` elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatParser;

impl FeatParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_feat(&self, element: &Element) -> Option<FeatRecord> {
        let name = entity_name(element)?;
        let prerequisites_text = element.child_text("prerequisite").map(str::to_string);
        let extraction = extract_citations(&element_text(element));
        let text = extraction.cleaned;

        // Passive score bonuses are stated in prose; their <modifier> twin is dropped.
        let mut modifiers: Vec<Modifier> = element
            .children_named("modifier")
            .filter(|m| !m.text().to_lowercase().starts_with("passive"))
            .filter_map(|m| parse_modifier_text(m.text(), m.attr("category").unwrap_or("bonus")))
            .collect();
        let passive_scores = parse_passive_scores(&text, &modifiers);
        modifiers.extend(parse_skill_advantages(&text));

        let mut proficiencies: Vec<FeatProficiency> = element
            .texts_of("proficiency")
            .into_iter()
            .map(|description| FeatProficiency {
                description,
                is_choice: false,
                quantity: None,
            })
            .collect();
        proficiencies.extend(parse_proficiencies(&text));

        let resets_on = parse_reset_timing(&text);
        let record = FeatRecord {
            prerequisites: parse_prerequisites(prerequisites_text.as_deref()),
            prerequisites_text,
            sources: extraction.citations,
            modifiers,
            passive_scores,
            hit_points_per_level: HIT_POINTS_PER_LEVEL
                .captures(&text)
                .and_then(|caps| caps[1].parse().ok()),
            proficiencies,
            conditions: parse_conditions(&text),
            spells: parse_spells(&text),
            languages: parse_languages(&text),
            resistances: parse_resistances(&text),
            movement_modifiers: parse_movement_modifiers(&text),
            resets_on,
            usage: parse_usage_limit(&text),
            uses_formula: USES_FORMULA
                .captures(&text)
                .map(|caps| caps[1].to_lowercase()),
            resource_cost: parse_description_cost(&text),
            description: text,
            name,
        };

        tracing::debug!(
            feat = %record.name,
            prerequisites = record.prerequisites.len(),
            spells = record.spells.len(),
            "Parsed feat"
        );
        Some(record)
    }
}

impl EntityParser for FeatParser {
    type Record = FeatRecord;
    const ELEMENT: &'static str = "feat";

    fn parse_element(&self, element: &Element) -> Option<FeatRecord> {
        self.parse_feat(element)
    }
}

// ============================================================================
// Text Extraction
// ============================================================================

/// Proficiencies granted in prose. A choice ("four weapons of your choice")
/// takes precedence over line-final fixed grants.
pub fn parse_proficiencies(text: &str) -> Vec<FeatProficiency> {
    let choices: Vec<FeatProficiency> = PROFICIENCY_CHOICE
        .captures_iter(text)
        .map(|caps| FeatProficiency {
            description: caps[2].trim().to_string(),
            is_choice: true,
            quantity: word_to_number(&caps[1]),
        })
        .collect();
    if !choices.is_empty() {
        return choices;
    }

    PROFICIENCY_FIXED
        .captures_iter(text)
        .flat_map(|caps| {
            caps[1]
                .split(" and ")
                .map(|part| part.trim().trim_end_matches(',').to_string())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
        })
        .map(|description| FeatProficiency {
            description,
            is_choice: false,
            quantity: None,
        })
        .collect()
}

/// Advantage and disadvantage statements. Skill check advantages become
/// modifiers instead.
pub fn parse_conditions(text: &str) -> Vec<FeatCondition> {
    let mut conditions = Vec::new();
    let mut collect = |pattern: &Regex, effect_type: FeatConditionEffect, skip_skills: bool| {
        for caps in pattern.captures_iter(text) {
            let description = caps[1].trim();
            if skip_skills && SKILL_CHECK.is_match(description) {
                continue;
            }
            conditions.push(FeatCondition {
                effect_type,
                description: description.to_string(),
            });
        }
    };
    collect(&*ADVANTAGE_ON, FeatConditionEffect::Advantage, true);
    collect(&*NO_DISADVANTAGE, FeatConditionEffect::NegatesDisadvantage, false);
    collect(&*DISADVANTAGE_ON, FeatConditionEffect::Disadvantage, true);
    conditions
}

/// Spells granted by name and spell choices, each choice in its own group.
pub fn parse_spells(text: &str) -> Vec<FeatSpell> {
    let mut spells = Vec::new();
    let usage_limit = parse_reset_timing(text);

    for caps in LEARN_SPELL.captures_iter(text) {
        let raw = caps[1].trim();
        let lower = raw.to_lowercase();
        if lower.contains("cantrip")
            || lower.contains("of your choice")
            || lower.starts_with(|c: char| c.is_ascii_digit())
        {
            continue;
        }
        spells.push(FeatSpell::Fixed {
            spell_name: title_case(raw),
            usage_limit,
        });
    }

    let mut group = 0;
    let mut next_group = || {
        group += 1;
        format!("spell_choice_{group}")
    };

    let schools: Vec<String> = SCHOOL_CONSTRAINT
        .captures(text)
        .map(|caps| {
            [caps.get(1), caps.get(2)]
                .into_iter()
                .flatten()
                .map(|m| m.as_str().to_lowercase())
                .collect()
        })
        .unwrap_or_default();

    if !schools.is_empty() {
        if let Some(caps) = SCHOOL_CHOICE.captures(text) {
            spells.push(FeatSpell::SchoolChoice {
                choice_group: next_group(),
                choice_count: word_to_number(&caps[1]).unwrap_or(1),
                max_level: caps[2].parse().unwrap_or(1),
                schools: schools.clone(),
            });
        }
    }

    for caps in CANTRIP_CHOICE.captures_iter(text) {
        spells.push(FeatSpell::CantripChoice {
            choice_group: next_group(),
            choice_count: word_to_number(&caps[1]).unwrap_or(1),
            class_name: caps[2].to_lowercase(),
        });
    }

    if schools.is_empty() {
        let is_ritual_only = RITUAL_ONLY.is_match(text);
        for caps in CLASS_SPELL_CHOICE.captures_iter(text) {
            let class_name = caps[3].to_lowercase();
            if class_name == "spell" || class_name == "spells" {
                continue;
            }
            spells.push(FeatSpell::ClassSpellChoice {
                choice_group: next_group(),
                choice_count: word_to_number(&caps[1]).unwrap_or(1),
                max_level: caps[2].parse().unwrap_or(1),
                class_name,
                is_ritual_only,
            });
        }
    }

    spells
}

pub fn parse_languages(text: &str) -> Vec<FeatLanguage> {
    LANGUAGE_CHOICE
        .captures_iter(text)
        .filter_map(|caps| word_to_number(&caps[1]))
        .map(|quantity| FeatLanguage {
            is_choice: true,
            quantity,
        })
        .collect()
}

/// "resistance to cold and poison damage", or all damage dealt by a source.
pub fn parse_resistances(text: &str) -> Vec<FeatResistance> {
    if let Some(caps) = RESIST_DEALT_BY.captures(text) {
        return vec![FeatResistance {
            damage_type: "all".to_string(),
            condition: Some(format!("dealt by {}", caps[1].trim())),
        }];
    }

    RESIST_TYPES
        .captures_iter(text)
        .flat_map(|caps| {
            caps[1]
                .split(" and ")
                .flat_map(|part| part.split(','))
                .map(|part| part.trim().trim_start_matches("or ").to_lowercase())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
        })
        .map(|damage_type| FeatResistance {
            damage_type,
            condition: None,
        })
        .collect()
}

/// Passive score bonuses. They apply only when the feat raises an ability
/// (the Observant pattern), whose code comes from the ability score modifier.
pub fn parse_passive_scores(text: &str, modifiers: &[Modifier]) -> Vec<PassiveScoreBonus> {
    let Some(value) = PASSIVE_BONUS
        .captures(text)
        .and_then(|caps| caps[1].parse::<i32>().ok())
    else {
        return Vec::new();
    };
    let has_chosen_ability = modifiers
        .iter()
        .any(|m| m.category == ModifierCategory::AbilityScore && m.ability_score_code.is_some());
    if !has_chosen_ability {
        return Vec::new();
    }

    PASSIVE_SKILL
        .captures_iter(text)
        .map(|caps| PassiveScoreBonus {
            ability_code: ability_code(&caps[1]).map(str::to_string),
            skill_name: caps[2].trim().to_string(),
            value,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
