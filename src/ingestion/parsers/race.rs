//! Race Parser
//!
//! One [`RaceRecord`] per `<race>` element. Beyond the structured fields
//! (size, speed, ability bonuses, `<proficiency>`, `<resist>`), most of a
//! race lives in its trait prose: language lists, condition advantages,
//! innate spells, natural weapons, special speeds, natural armor and movement
//! modifiers are all read from the traits.
//!
//! A "<Race>, Variants" bundle whose subspecies traits hold two or more
//! mutually exclusive "Variant: X" traits is expanded into one record per
//! variant, plus a base variant that keeps the trait the others replace.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::common::{entity_name, parse_trait_elements, EntityParser, TraitRecord};
use crate::ingestion::concerns::item_proficiencies::{infer_proficiency_type, ProficiencyType};
use crate::ingestion::concerns::languages::{extract_languages_from_text, LanguageGrant};
use crate::ingestion::concerns::modifiers::{parse_modifier_elements, Modifier};
use crate::ingestion::concerns::movement_modifiers::{parse_movement_modifiers, MovementModifier};
use crate::ingestion::concerns::movement_speeds::{parse_movement_speeds, MovementSpeeds};
use crate::ingestion::concerns::natural_weapons::{parse_natural_weapon, NaturalWeapon};
use crate::ingestion::concerns::source_citations::SourceCitation;
use crate::ingestion::concerns::unarmored_ac::{parse_unarmored_ac, UnarmoredAc};
use crate::ingestion::concerns::usage_limits::{parse_usage_limit, UsageLimit};
use crate::ingestion::concerns::vocabulary::word_to_number;
use crate::ingestion::xml::Element;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityBonus {
    /// Ability code as written ("Str", "Cha")
    pub ability: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceProficiency {
    #[serde(rename = "type")]
    pub proficiency_type: ProficiencyType,
    /// `None` for "one skill of your choice"
    pub name: Option<String>,
    pub grants: bool,
    pub is_choice: bool,
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionEffect {
    Immunity,
    Advantage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceCondition {
    pub condition_name: String,
    pub effect_type: ConditionEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceConstraint {
    /// Each pick must be a different ability
    Different,
    Any,
    /// One of the abilities the text names
    Specific,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityChoice {
    pub choice_count: u32,
    pub value: i32,
    pub choice_constraint: ChoiceConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RaceSpell {
    /// A named spell the race always knows
    Fixed {
        spell_name: String,
        is_cantrip: bool,
        level_requirement: Option<u32>,
        usage_limit: Option<String>,
    },
    /// "one cantrip of your choice from the wizard spell list"
    ClassChoice {
        choice_count: u32,
        class_name: String,
        max_level: u32,
        is_cantrip: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSpellcasting {
    pub ability: Option<String>,
    pub spells: Vec<RaceSpell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitUsage {
    pub trait_name: String,
    pub usage: UsageLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub name: String,
    pub base_race_name: Option<String>,
    pub size_code: Option<String>,
    pub speed: u32,
    pub traits: Vec<TraitRecord>,
    /// Species, description and uncategorized traits
    pub base_traits: Vec<TraitRecord>,
    /// Subspecies traits only
    pub subrace_traits: Vec<TraitRecord>,
    pub ability_bonuses: Vec<AbilityBonus>,
    pub sources: Vec<SourceCitation>,
    pub proficiencies: Vec<RaceProficiency>,
    pub languages: Vec<LanguageGrant>,
    pub conditions: Vec<RaceCondition>,
    pub ability_choices: Vec<AbilityChoice>,
    pub spellcasting: RaceSpellcasting,
    pub resistances: Vec<String>,
    pub modifiers: Vec<Modifier>,
    pub bonus_feats: u32,
    pub natural_weapons: Vec<NaturalWeapon>,
    pub movement_speeds: Option<MovementSpeeds>,
    pub unarmored_ac: Option<UnarmoredAc>,
    pub movement_modifiers: Vec<MovementModifier>,
    pub trait_usages: Vec<TraitUsage>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static PARENTHETICAL_SUBRACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s*\((.+)\)$").expect("Failed to compile subrace name regex")
});

static ABILITY_BONUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{3})\s*([+-]\d+)$").expect("Failed to compile ability bonus regex")
});

static IMMUNE_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)immune to (disease|magical aging)").expect("Failed to compile immunity regex")
});

static ADVANTAGE_AGAINST_BEING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)advantage on saving throws against being (\w+)")
        .expect("Failed to compile condition advantage regex")
});

static ADVANTAGE_AGAINST_POISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)advantage on saving throws against poison")
        .expect("Failed to compile poison advantage regex")
});

static DIFFERENT_SCORES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w+)\s+(?:different|other)\s+ability scores?\s+of your choice\s+increases?\s+by\s+(\d+)")
        .expect("Failed to compile different scores regex")
});

static ONE_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)one (?:other )?ability score of your choice increases by (\d+)")
        .expect("Failed to compile one score regex")
});

static EITHER_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Increase either your (\w+) or (\w+) score by (\d+)")
        .expect("Failed to compile either score regex")
});

static SKILL_AND_TOOL_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w+)\s+skill\s+proficienc(?:y|ies)\s+and\s+(\w+)\s+tool\s+proficienc(?:y|ies)\s+of your choice")
        .expect("Failed to compile skill and tool choice regex")
});

static GAIN_SKILL_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)You gain proficienc(?:y|ies) in (\w+)\s+skills?\s+of your choice")
        .expect("Failed to compile skill choice regex")
});

static SKILL_PROFICIENCY_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w+)\s+skill\s+proficienc(?:y|ies)\s+of your choice")
        .expect("Failed to compile skill proficiency choice regex")
});

static GAIN_TOOL_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)You gain proficienc(?:y|ies) in (\w+)\s+tools?\s+of your choice")
        .expect("Failed to compile tool choice regex")
});

static TOOL_PROFICIENCY_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w+)\s+tool\s+proficienc(?:y|ies)\s+of your choice")
        .expect("Failed to compile tool proficiency choice regex")
});

static BONUS_FEAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)you gain (?:one|a) feat of your choice").expect("Failed to compile bonus feat regex")
});

static CANTRIP_FROM_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)You know (?:one|a) (?:\w+ )?cantrip of your choice from the ([\w\s]+?) spell list")
        .expect("Failed to compile cantrip choice regex")
});

static KNOWN_CANTRIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)You know the ([\w\s'’]+?) cantrip").expect("Failed to compile known cantrip regex")
});

static LEVELED_SPELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Once you reach (\d+)(?:st|nd|rd|th) level.*?cast the ([\w\s'’]+?) spell")
        .expect("Failed to compile leveled spell regex")
});

static CAST_ONCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)You can cast the ([\w\s'’]+?) spell once").expect("Failed to compile cast once regex")
});

static SHORT_REST_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)short or long rest|short rest").expect("Failed to compile short rest regex")
});

static REPLACES_TRAIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)replaces\s+the\s+([A-Za-z\s]+?)\s+trait").expect("Failed to compile replaces trait regex")
});

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RaceParser;

impl RaceParser {
    pub fn new() -> Self {
        Self
    }

    /// Records for one `<race>` element: one, or several for a variant bundle.
    pub fn parse_race(&self, element: &Element) -> Vec<RaceRecord> {
        let Some(full_name) = entity_name(element) else {
            tracing::warn!("Skipping race element without a name");
            return Vec::new();
        };

        if is_variant_bundle(&full_name, element) {
            return expand_variant_bundle(&full_name, element);
        }

        let (base_race_name, name) = split_race_name(&full_name);
        let traits = parse_trait_elements(element, "trait");
        vec![build_record(element, name, base_race_name, traits)]
    }
}

impl EntityParser for RaceParser {
    type Record = RaceRecord;
    const ELEMENT: &'static str = "race";

    fn parse_element(&self, element: &Element) -> Option<RaceRecord> {
        self.parse_race(element).into_iter().next()
    }

    fn parse_root(&self, root: &Element) -> Vec<RaceRecord> {
        let records: Vec<RaceRecord> = root
            .children_named(Self::ELEMENT)
            .flat_map(|race| self.parse_race(race))
            .collect();
        tracing::debug!(count = records.len(), "Parsed races");
        records
    }
}

/// "Dwarf, Mark of Warding" -> (Some("Dwarf"), "Mark of Warding");
/// "Dwarf (Hill)" -> (Some("Dwarf"), "Dwarf (Hill)").
pub fn split_race_name(full_name: &str) -> (Option<String>, String) {
    if let Some((base, race)) = full_name.split_once(',') {
        return (Some(base.trim().to_string()), race.trim().to_string());
    }
    if let Some(caps) = PARENTHETICAL_SUBRACE.captures(full_name) {
        return (Some(caps[1].trim().to_string()), full_name.to_string());
    }
    (None, full_name.to_string())
}

fn build_record(
    element: &Element,
    name: String,
    base_race_name: Option<String>,
    traits: Vec<TraitRecord>,
) -> RaceRecord {
    let (subrace_traits, base_traits): (Vec<_>, Vec<_>) = traits
        .iter()
        .cloned()
        .partition(|t| t.category.as_deref() == Some("subspecies"));

    let speed = element.child_int("speed").unwrap_or(0).max(0) as u32;

    let sources = traits
        .iter()
        .find(|t| !t.sources.is_empty())
        .map(|t| t.sources.clone())
        .unwrap_or_default();

    let mut proficiencies = parse_proficiencies(element);
    proficiencies.extend(parse_proficiency_choices(&traits));

    let mut movement_speeds: Option<MovementSpeeds> = None;
    for t in &traits {
        if let Some(found) = parse_movement_speeds(&t.description, speed) {
            match movement_speeds.as_mut() {
                Some(existing) => existing.merge(found),
                None => movement_speeds = Some(found),
            }
        }
    }

    RaceRecord {
        name,
        base_race_name,
        size_code: element.child_text("size").map(str::to_string),
        speed,
        base_traits,
        subrace_traits,
        ability_bonuses: parse_ability_bonuses(element),
        sources,
        proficiencies,
        languages: parse_languages(&traits),
        conditions: parse_conditions(&traits),
        ability_choices: parse_ability_choices(&traits),
        spellcasting: parse_spellcasting(element, &traits),
        resistances: element.texts_of("resist"),
        modifiers: element
            .children_named("trait")
            .flat_map(parse_modifier_elements)
            .collect(),
        bonus_feats: traits
            .iter()
            .filter(|t| t.name.eq_ignore_ascii_case("feat") && BONUS_FEAT.is_match(&t.description))
            .count() as u32,
        natural_weapons: traits
            .iter()
            .filter_map(|t| parse_natural_weapon(&t.name, &t.description))
            .collect(),
        movement_speeds,
        unarmored_ac: traits.iter().find_map(|t| parse_unarmored_ac(&t.description)),
        movement_modifiers: traits
            .iter()
            .flat_map(|t| parse_movement_modifiers(&t.description))
            .collect(),
        trait_usages: traits
            .iter()
            .filter_map(|t| {
                parse_usage_limit(&t.description).map(|usage| TraitUsage {
                    trait_name: t.name.clone(),
                    usage,
                })
            })
            .collect(),
        traits,
    }
}

// ============================================================================
// Structured Fields
// ============================================================================

/// `<ability>Str +2, Cha +1</ability>`
pub fn parse_ability_bonuses(element: &Element) -> Vec<AbilityBonus> {
    element
        .child_text("ability")
        .map(|text| {
            text.split(',')
                .filter_map(|part| {
                    let caps = ABILITY_BONUS.captures(part.trim())?;
                    Some(AbilityBonus {
                        ability: caps[1].to_string(),
                        value: caps[2].parse().ok()?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_proficiencies(element: &Element) -> Vec<RaceProficiency> {
    let granted = |proficiency_type, name: &str| RaceProficiency {
        proficiency_type,
        name: Some(name.to_string()),
        grants: true,
        is_choice: false,
        quantity: None,
    };

    let mut proficiencies: Vec<RaceProficiency> = element
        .children_named("proficiency")
        .flat_map(|p| p.text().split(',').map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>())
        .map(|name| granted(infer_proficiency_type(name), name))
        .collect();

    for (tag, proficiency_type) in [("weapons", ProficiencyType::Weapon), ("armor", ProficiencyType::Armor)] {
        if let Some(text) = element.child_text(tag) {
            for name in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                proficiencies.push(granted(proficiency_type, name));
            }
        }
    }

    proficiencies
}

fn choice(proficiency_type: ProficiencyType, word: &str) -> RaceProficiency {
    RaceProficiency {
        proficiency_type,
        name: None,
        grants: true,
        is_choice: true,
        quantity: word_to_number(word),
    }
}

/// "one skill proficiency and one tool proficiency of your choice" and the
/// simpler skill-only and tool-only phrasings.
pub fn parse_proficiency_choices(traits: &[TraitRecord]) -> Vec<RaceProficiency> {
    let mut choices = Vec::new();

    for t in traits {
        let text = t.description.as_str();

        if let Some(caps) = SKILL_AND_TOOL_CHOICE.captures(text) {
            choices.push(choice(ProficiencyType::Skill, &caps[1]));
            choices.push(choice(ProficiencyType::Tool, &caps[2]));
            continue;
        }

        for (pattern, proficiency_type) in [
            (&GAIN_SKILL_CHOICE, ProficiencyType::Skill),
            (&SKILL_PROFICIENCY_CHOICE, ProficiencyType::Skill),
            (&GAIN_TOOL_CHOICE, ProficiencyType::Tool),
            (&TOOL_PROFICIENCY_CHOICE, ProficiencyType::Tool),
        ] {
            if let Some(caps) = pattern.captures(text) {
                choices.push(choice(proficiency_type, &caps[1]));
            }
        }
    }

    choices
}

fn parse_languages(traits: &[TraitRecord]) -> Vec<LanguageGrant> {
    traits
        .iter()
        .find(|t| t.name == "Languages")
        .map(|t| extract_languages_from_text(&t.description))
        .unwrap_or_default()
}

pub fn parse_conditions(traits: &[TraitRecord]) -> Vec<RaceCondition> {
    let mut conditions = Vec::new();

    for t in traits {
        let text = t.description.as_str();
        if let Some(caps) = IMMUNE_TO.captures(text) {
            conditions.push(RaceCondition {
                condition_name: caps[1].to_lowercase(),
                effect_type: ConditionEffect::Immunity,
            });
        }
        if let Some(caps) = ADVANTAGE_AGAINST_BEING.captures(text) {
            conditions.push(RaceCondition {
                condition_name: caps[1].to_lowercase(),
                effect_type: ConditionEffect::Advantage,
            });
        }
        if ADVANTAGE_AGAINST_POISON.is_match(text) {
            conditions.push(RaceCondition {
                condition_name: "poisoned".to_string(),
                effect_type: ConditionEffect::Advantage,
            });
        }
    }

    conditions
}

/// Ability score choices stated by the "Ability Score Increase(s)" trait.
pub fn parse_ability_choices(traits: &[TraitRecord]) -> Vec<AbilityChoice> {
    traits
        .iter()
        .filter(|t| t.name == "Ability Score Increase" || t.name == "Ability Score Increases")
        .filter_map(|t| {
            let text = t.description.as_str();
            if let Some(caps) = DIFFERENT_SCORES.captures(text) {
                Some(AbilityChoice {
                    choice_count: word_to_number(&caps[1]).unwrap_or(1),
                    value: caps[2].parse().ok()?,
                    choice_constraint: ChoiceConstraint::Different,
                })
            } else if let Some(caps) = ONE_SCORE.captures(text) {
                Some(AbilityChoice {
                    choice_count: 1,
                    value: caps[1].parse().ok()?,
                    choice_constraint: ChoiceConstraint::Any,
                })
            } else {
                EITHER_SCORE.captures(text).and_then(|caps| {
                    Some(AbilityChoice {
                        choice_count: 1,
                        value: caps[3].parse().ok()?,
                        choice_constraint: ChoiceConstraint::Specific,
                    })
                })
            }
        })
        .collect()
}

/// Innate spells: cantrip choices from a class list, known cantrips, spells
/// unlocked at a character level, and spells castable once per rest.
pub fn parse_spellcasting(element: &Element, traits: &[TraitRecord]) -> RaceSpellcasting {
    let mut spells = Vec::new();

    for t in traits {
        let text = t.description.as_str();
        let lower = text.to_lowercase();
        if !lower.contains("cantrip") && !lower.contains("cast") && !lower.contains("spell") {
            continue;
        }

        if let Some(caps) = CANTRIP_FROM_LIST.captures(text) {
            for class_name in caps[1].to_lowercase().split(" or ") {
                spells.push(RaceSpell::ClassChoice {
                    choice_count: 1,
                    class_name: class_name.trim().to_string(),
                    max_level: 0,
                    is_cantrip: true,
                });
            }
        }

        for caps in KNOWN_CANTRIP.captures_iter(text) {
            spells.push(RaceSpell::Fixed {
                spell_name: caps[1].trim().to_string(),
                is_cantrip: true,
                level_requirement: None,
                usage_limit: None,
            });
        }

        for caps in LEVELED_SPELL.captures_iter(text) {
            spells.push(RaceSpell::Fixed {
                spell_name: caps[2].trim().to_string(),
                is_cantrip: false,
                level_requirement: caps[1].parse().ok(),
                usage_limit: Some("1/long rest".to_string()),
            });
        }

        for caps in CAST_ONCE.captures_iter(text) {
            let usage_limit = if SHORT_REST_MENTION.is_match(text) {
                "1/short rest"
            } else {
                "1/long rest"
            };
            spells.push(RaceSpell::Fixed {
                spell_name: caps[1].trim().to_string(),
                is_cantrip: false,
                level_requirement: None,
                usage_limit: Some(usage_limit.to_string()),
            });
        }
    }

    RaceSpellcasting {
        ability: element.child_text("spellAbility").map(str::to_string),
        spells,
    }
}

// ============================================================================
// Variant Bundles
// ============================================================================

fn is_variant_trait(t: &TraitRecord) -> bool {
    t.category.as_deref() == Some("subspecies")
        && t.name.starts_with("Variant:")
        && !t.name.contains("Appearance")
}

fn is_variant_bundle(full_name: &str, element: &Element) -> bool {
    full_name.ends_with(", Variants")
        && parse_trait_elements(element, "trait")
            .iter()
            .filter(|t| is_variant_trait(t))
            .count()
            >= 2
}

fn expand_variant_bundle(full_name: &str, element: &Element) -> Vec<RaceRecord> {
    let base_race_name = full_name
        .split(',')
        .next()
        .map(|s| s.trim().to_string());
    let traits = parse_trait_elements(element, "trait");

    let variants: Vec<&TraitRecord> = traits.iter().filter(|t| is_variant_trait(t)).collect();
    let appearance = traits
        .iter()
        .find(|t| t.category.as_deref() == Some("subspecies") && t.name.contains("Appearance"));
    let replaced: Vec<String> = variants
        .iter()
        .filter_map(|t| REPLACES_TRAIT.captures(&t.description))
        .map(|caps| caps[1].trim().to_string())
        .collect();

    let mut shared = Vec::new();
    let mut replaceable = None;
    for t in traits.iter().filter(|t| t.category.as_deref() != Some("subspecies")) {
        if t.category.as_deref() == Some("species") && replaced.contains(&t.name) {
            replaceable = Some(t.clone());
        } else {
            shared.push(t.clone());
        }
    }

    let with_extras = |extra: Option<TraitRecord>| {
        let mut set = shared.clone();
        set.extend(extra);
        set.extend(appearance.cloned());
        set
    };

    let mut records = vec![build_record(
        element,
        "Feral".to_string(),
        base_race_name.clone(),
        with_extras(replaceable),
    )];

    for variant in variants {
        let name = variant.name.trim_start_matches("Variant:").trim().to_string();
        records.push(build_record(
            element,
            name,
            base_race_name.clone(),
            with_extras(Some(variant.clone())),
        ));
    }

    records
}
