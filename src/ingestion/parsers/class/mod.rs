//! Class Parser
//!
//! Builds one [`ClassRecord`] per `<class>` element: hit die, proficiencies,
//! per-level features and counters gathered from every `<autolevel>`, the base
//! spell progression, starting equipment, multiclass minimums, and the
//! subclasses the features describe.
//!
//! A class whose only `<slots>` are flagged optional (Fighter, Rogue) has no
//! base progression and no `spellcasting_ability` at all; the optional table
//! moves to the subclass with a matching `Spellcasting (<Subclass>)` feature.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::parsers::{ClassParser, EntityParser};
//!
//! let classes = ClassParser::new().parse(&xml)?;
//! for class in &classes {
//!     println!("{}: {} subclasses", class.name, class.subclasses.len());
//! }
//! ```

pub mod equipment;
pub mod feature_choices;
pub mod multiclass;
pub mod spell_progression;
pub mod subclasses;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::common::{
    element_text, entity_name, parse_roll_elements, parse_trait_elements, EntityParser,
    RollRecord, TraitRecord,
};
use crate::ingestion::concerns::item_proficiencies::ProficiencyType;
use crate::ingestion::concerns::languages::LanguageGrant;
use crate::ingestion::concerns::modifiers::{parse_modifier_elements, Modifier};
use crate::ingestion::concerns::resource_costs::{parse_description_cost, ResourceCost};
use crate::ingestion::concerns::rest_timing::{parse_reset_timing, ResetTiming};
use crate::ingestion::concerns::source_citations::{extract_citations, SourceCitation};
use crate::ingestion::concerns::subclass_spell_tables::{parse_subclass_spell_table, SubclassSpellLevel};
use crate::ingestion::concerns::vocabulary::{is_ability_name, match_language, word_to_number};
use crate::ingestion::xml::Element;

pub use equipment::{
    parse_equipment, ChoiceItem, ChoiceItemKind, EquipmentChoiceItem, StartingEquipment,
};
pub use feature_choices::parse_feature_choice_progressions;
pub use multiclass::{parse_multiclass_requirements, MulticlassRequirement};
pub use spell_progression::{
    has_non_optional_slots, parse_optional_spell_slots, parse_spell_slots, OptionalSpellcasting,
    SpellProgression,
};
pub use subclasses::{
    feature_belongs_to_subclass, partition_subclasses, SubclassPartition, SubclassRecord,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellPreparationMethod {
    Spellbook,
    Known,
    Prepared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassProficiency {
    #[serde(rename = "type")]
    pub proficiency_type: ProficiencyType,
    pub name: String,
    pub is_choice: bool,
    pub choice_group: Option<String>,
    pub choice_option: Option<u32>,
    /// How many to pick; set on the first member of a choice group only
    pub quantity: Option<u32>,
    /// "artisan" or "musical_instrument" for tool choices
    pub subcategory: Option<String>,
}

impl ClassProficiency {
    fn fixed(proficiency_type: ProficiencyType, name: &str) -> Self {
        Self {
            proficiency_type,
            name: name.to_string(),
            is_choice: false,
            choice_group: None,
            choice_option: None,
            quantity: None,
            subcategory: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFeature {
    pub level: u32,
    pub name: String,
    pub description: String,
    pub is_optional: bool,
    pub sources: Vec<SourceCitation>,
    /// Position across all autolevels; subclass removal leaves gaps
    pub sort_order: u32,
    pub rolls: Vec<RollRecord>,
    pub special_tags: Vec<String>,
    pub modifiers: Vec<Modifier>,
    pub grants_asi: bool,
    pub resets_on: Option<ResetTiming>,
    /// Domain, circle or oath spells printed as a level table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_table: Option<Vec<SubclassSpellLevel>>,
    pub resource_cost: Option<ResourceCost>,
}

/// A per-level resource pool (`Ki`, `Superiority Die`, `Rages`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounter {
    pub level: u32,
    pub name: String,
    pub value: u32,
    pub reset_timing: Option<ResetTiming>,
    pub subclass: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub hit_die: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spellcasting_ability: Option<String>,
    pub description: Option<String>,
    pub proficiencies: Vec<ClassProficiency>,
    pub skill_choices: Option<u32>,
    pub traits: Vec<TraitRecord>,
    pub features: Vec<ClassFeature>,
    pub multiclass_requirements: Vec<MulticlassRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_progression: Option<Vec<SpellProgression>>,
    pub spell_preparation_method: Option<SpellPreparationMethod>,
    pub counters: Vec<ClassCounter>,
    pub subclasses: Vec<SubclassRecord>,
    /// Label of the subclass introductions ("Martial Archetype")
    pub archetype: Option<String>,
    pub equipment: StartingEquipment,
    pub languages: Vec<LanguageGrant>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static TOOL_CHOICE_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:any\s+)?(one|two|three|four|five|\d+)\b")
        .expect("Failed to compile tool choice quantity regex")
});

static ARTISAN_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)artisan'?s?['’]?\s*tools?.*(?:choice|of\s+your)|(?:one|any|two|three)\s+(?:type\s+of\s+)?artisan")
        .expect("Failed to compile artisan tool choice regex")
});

static INSTRUMENT_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)musical\s+instruments?.*(?:choice|of\s+your)|(?:one|any|two|three)\s+(?:type\s+of\s+)?musical\s+instruments?")
        .expect("Failed to compile musical instrument choice regex")
});

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ClassParser;

impl ClassParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_class(&self, element: &Element) -> Option<ClassRecord> {
        let name = entity_name(element)?;

        let spellcasting_ability = if has_non_optional_slots(element) {
            element.child_text("spellAbility").map(str::to_string)
        } else {
            None
        };

        let description = {
            let texts: Vec<&str> = element.children_named("text").map(Element::text).collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n\n"))
            }
        };

        let features = parse_features(element);
        let multiclass_requirements = parse_multiclass_requirements(&features, &name);

        let mut counters = parse_counters(element);
        counters.extend(parse_feature_choice_progressions(&features));

        let mut spell_progression = parse_spell_slots(element);
        let optional_spellcasting = parse_optional_spell_slots(element);
        let spell_preparation_method = spell_preparation_method(&features, &spell_progression);
        if spell_preparation_method == Some(SpellPreparationMethod::Spellbook) {
            add_spellbook_progression(&mut spell_progression);
        }

        let SubclassPartition {
            subclasses,
            base_features,
            archetype,
        } = partition_subclasses(features, &counters, optional_spellcasting);

        let languages = parse_language_grants(&base_features);

        tracing::debug!(
            class = %name,
            features = base_features.len(),
            subclasses = subclasses.len(),
            "Parsed class"
        );

        Some(ClassRecord {
            hit_die: element.child_int("hd").unwrap_or(0).max(0) as u32,
            spellcasting_ability,
            description,
            proficiencies: parse_proficiencies(element),
            skill_choices: element.child_int("numSkills").map(|n| n.max(0) as u32),
            traits: parse_trait_elements(element, "trait"),
            features: base_features,
            multiclass_requirements,
            spell_progression: if spell_progression.is_empty() {
                None
            } else {
                Some(spell_progression)
            },
            spell_preparation_method,
            counters,
            subclasses,
            archetype,
            equipment: parse_equipment(element),
            languages,
            name,
        })
    }
}

impl EntityParser for ClassParser {
    type Record = ClassRecord;
    const ELEMENT: &'static str = "class";

    fn parse_element(&self, element: &Element) -> Option<ClassRecord> {
        self.parse_class(element)
    }
}

// ============================================================================
// Proficiencies
// ============================================================================

/// Armor, weapons, tools, then saving throws and skills from `<proficiency>`.
pub fn parse_proficiencies(class: &Element) -> Vec<ClassProficiency> {
    let mut proficiencies = Vec::new();
    let mut choice_counter = 1;

    for (tag, proficiency_type) in [("armor", ProficiencyType::Armor), ("weapons", ProficiencyType::Weapon)] {
        for name in listed(class, tag) {
            proficiencies.push(ClassProficiency::fixed(proficiency_type, name));
        }
    }

    for tool in listed(class, "tools") {
        let subcategory = if ARTISAN_CHOICE.is_match(tool) {
            Some("artisan")
        } else if INSTRUMENT_CHOICE.is_match(tool) {
            Some("musical_instrument")
        } else {
            None
        };

        match subcategory {
            Some(subcategory) => {
                proficiencies.push(ClassProficiency {
                    is_choice: true,
                    choice_group: Some(format!("tool_choice_{}", choice_counter)),
                    quantity: Some(tool_choice_quantity(tool)),
                    subcategory: Some(subcategory.to_string()),
                    ..ClassProficiency::fixed(ProficiencyType::Tool, tool)
                });
                choice_counter += 1;
            }
            None => proficiencies.push(ClassProficiency::fixed(ProficiencyType::Tool, tool)),
        }
    }

    let num_skills = class.child_int("numSkills").map(|n| n.max(0) as u32);
    let mut skills = Vec::new();
    for name in listed(class, "proficiency") {
        if is_ability_name(name) {
            proficiencies.push(ClassProficiency::fixed(ProficiencyType::SavingThrow, name));
        } else {
            skills.push(name);
        }
    }

    match num_skills {
        Some(quantity) if !skills.is_empty() => {
            let group = format!("skill_choice_{}", choice_counter);
            for (index, name) in skills.into_iter().enumerate() {
                proficiencies.push(ClassProficiency {
                    is_choice: true,
                    choice_group: Some(group.clone()),
                    choice_option: Some(index as u32 + 1),
                    quantity: (index == 0).then_some(quantity),
                    ..ClassProficiency::fixed(ProficiencyType::Skill, name)
                });
            }
        }
        _ => {
            for name in skills {
                proficiencies.push(ClassProficiency::fixed(ProficiencyType::Skill, name));
            }
        }
    }

    proficiencies
}

/// Comma separated entries of a child element, without "none".
fn listed<'a>(class: &'a Element, tag: &str) -> Vec<&'a str> {
    class
        .child_text(tag)
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
                .collect()
        })
        .unwrap_or_default()
}

fn tool_choice_quantity(tool: &str) -> u32 {
    TOOL_CHOICE_QUANTITY
        .captures(tool)
        .and_then(|caps| word_to_number(&caps[1]))
        .unwrap_or(1)
}

// ============================================================================
// Features and Counters
// ============================================================================

/// Features of every autolevel, numbered in document order.
pub fn parse_features(class: &Element) -> Vec<ClassFeature> {
    let mut features = Vec::new();
    let mut sort_order = 0;

    for autolevel in class.children_named("autolevel") {
        let level = autolevel_level(autolevel);
        let grants_asi = autolevel.attr_is_yes("scoreImprovement");

        for feature in autolevel.children_named("feature") {
            let text = element_text(feature);
            let extraction = extract_citations(&text);

            features.push(ClassFeature {
                level,
                name: feature.child_text_or_empty("name").to_string(),
                resets_on: parse_reset_timing(&extraction.cleaned),
                spell_table: parse_subclass_spell_table(&extraction.cleaned),
                resource_cost: parse_description_cost(&extraction.cleaned),
                description: extraction.cleaned,
                is_optional: feature.attr_is_yes("optional"),
                sources: extraction.citations,
                sort_order,
                rolls: parse_roll_elements(feature),
                special_tags: feature.texts_of("special"),
                modifiers: parse_modifier_elements(feature),
                grants_asi,
            });
            sort_order += 1;
        }
    }

    features
}

/// `<counter>` elements: name, value, `S`/`L` reset and optional subclass.
pub fn parse_counters(class: &Element) -> Vec<ClassCounter> {
    class
        .children_named("autolevel")
        .flat_map(|autolevel| {
            let level = autolevel_level(autolevel);
            autolevel.children_named("counter").filter_map(move |counter| {
                Some(ClassCounter {
                    level,
                    name: counter.child_text("name")?.to_string(),
                    value: counter.child_int("value").unwrap_or(0).max(0) as u32,
                    reset_timing: counter.child_text("reset").and_then(counter_reset),
                    subclass: counter.child_text("subclass").map(str::to_string),
                })
            })
        })
        .collect()
}

fn counter_reset(code: &str) -> Option<ResetTiming> {
    match code.trim().to_ascii_uppercase().as_str() {
        "S" => Some(ResetTiming::ShortRest),
        "L" => Some(ResetTiming::LongRest),
        _ => None,
    }
}

fn autolevel_level(autolevel: &Element) -> u32 {
    autolevel
        .attr("level")
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or(0)
}

/// Features named after a language (Thieves' Cant, Druidic) grant it.
pub fn parse_language_grants(features: &[ClassFeature]) -> Vec<LanguageGrant> {
    features
        .iter()
        .filter_map(|f| match_language(&f.name))
        .map(LanguageGrant::fixed)
        .collect()
}

// ============================================================================
// Spell Preparation
// ============================================================================

pub fn spell_preparation_method(
    features: &[ClassFeature],
    progression: &[SpellProgression],
) -> Option<SpellPreparationMethod> {
    if progression.is_empty() {
        return None;
    }

    let mentions_spellbook = features
        .iter()
        .filter(|f| f.name == "Spellcasting")
        .any(|f| f.description.to_lowercase().contains("spellbook"));

    let known: Vec<(u32, u32)> = progression
        .iter()
        .filter_map(|row| row.spells_known.map(|k| (row.level, k)))
        .collect();

    let spellbook_formula = !known.is_empty()
        && known
            .iter()
            .all(|(level, k)| *level >= 1 && *k == spellbook_spells_known(*level));

    if mentions_spellbook || spellbook_formula {
        Some(SpellPreparationMethod::Spellbook)
    } else if !known.is_empty() {
        Some(SpellPreparationMethod::Known)
    } else {
        Some(SpellPreparationMethod::Prepared)
    }
}

/// Spells in a spellbook: six at 1st level and two more per level.
pub fn spellbook_spells_known(level: u32) -> u32 {
    6 + level.saturating_sub(1) * 2
}

/// Fill `spells_known` of spellbook rows that carry no counter.
pub fn add_spellbook_progression(progression: &mut [SpellProgression]) {
    for row in progression.iter_mut().filter(|row| row.spells_known.is_none()) {
        row.spells_known = Some(spellbook_spells_known(row.level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::xml::parse_document;

    fn class(xml: &str) -> ClassRecord {
        let root = parse_document(xml).unwrap();
        ClassParser::new().parse_element(&root).unwrap()
    }

    #[test]
    fn test_proficiencies_with_skill_choice() {
        let record = class(
            r#"<class><name>Rogue</name><hd>8</hd>
                <proficiency>Dexterity, Intelligence, Acrobatics, Athletics, Deception</proficiency>
                <numSkills>4</numSkills>
                <armor>Light Armor</armor><weapons>Simple Weapons, Hand Crossbows</weapons>
                <tools>Thieves' Tools</tools></class>"#,
        );
        let saves: Vec<_> = record
            .proficiencies
            .iter()
            .filter(|p| p.proficiency_type == ProficiencyType::SavingThrow)
            .collect();
        assert_eq!(saves.len(), 2);

        let skills: Vec<_> = record
            .proficiencies
            .iter()
            .filter(|p| p.proficiency_type == ProficiencyType::Skill)
            .collect();
        assert_eq!(skills.len(), 3);
        assert!(skills.iter().all(|s| s.is_choice));
        assert_eq!(skills[0].quantity, Some(4));
        assert_eq!(skills[1].quantity, None);
        assert_eq!(skills[2].choice_option, Some(3));
        assert_eq!(record.skill_choices, Some(4));
        assert_eq!(record.hit_die, 8);
    }

    #[test]
    fn test_skills_without_num_skills_are_fixed() {
        let record = class(
            "<class><name>Sidekick</name><proficiency>Strength, Athletics</proficiency></class>",
        );
        let skill = record
            .proficiencies
            .iter()
            .find(|p| p.proficiency_type == ProficiencyType::Skill)
            .unwrap();
        assert!(!skill.is_choice);
        assert_eq!(skill.choice_group, None);
    }

    #[test]
    fn test_tool_choices() {
        let record = class(
            "<class><name>Monk</name><tools>One type of artisan's tools or one musical instrument of your choice, Herbalism Kit</tools></class>",
        );
        let tools: Vec<_> = record.proficiencies.iter().collect();
        assert_eq!(tools.len(), 2);
        assert!(tools[0].is_choice);
        assert_eq!(tools[0].choice_group.as_deref(), Some("tool_choice_1"));
        assert_eq!(tools[0].quantity, Some(1));
        assert!(!tools[1].is_choice);
    }

    #[test]
    fn test_features_and_language() {
        let record = class(
            r#"<class><name>Rogue</name>
                <autolevel level="1">
                  <feature><name>Thieves' Cant</name><text>You learn thieves' cant.</text><text>Source: Player's Handbook (2014) p. 96</text></feature>
                </autolevel>
                <autolevel level="4" scoreImprovement="YES">
                  <feature><name>Ability Score Improvement</name><text>Increase one score by 2.</text></feature>
                </autolevel></class>"#,
        );
        assert_eq!(record.features.len(), 2);
        assert_eq!(record.features[0].sources[0].code, "PHB");
        assert_eq!(record.features[0].description, "You learn thieves' cant.");
        assert!(record.features[1].grants_asi);
        assert_eq!(record.features[1].sort_order, 1);
        assert_eq!(
            record.languages,
            vec![LanguageGrant {
                slug: Some("thieves-cant".to_string()),
                is_choice: false
            }]
        );
    }

    #[test]
    fn test_counters() {
        let record = class(
            r#"<class><name>Monk</name><autolevel level="2"><counter><name>Ki</name><value>2</value><reset>S</reset></counter></autolevel></class>"#,
        );
        assert_eq!(record.counters.len(), 1);
        assert_eq!(record.counters[0].reset_timing, Some(ResetTiming::ShortRest));
        assert!(record.subclasses.is_empty());
    }

    #[test]
    fn test_preparation_method() {
        let row = |level, known| SpellProgression {
            level,
            spells_known: known,
            ..Default::default()
        };
        assert_eq!(spell_preparation_method(&[], &[]), None);
        assert_eq!(
            spell_preparation_method(&[], &[row(1, None)]),
            Some(SpellPreparationMethod::Prepared)
        );
        assert_eq!(
            spell_preparation_method(&[], &[row(1, Some(4)), row(2, Some(5))]),
            Some(SpellPreparationMethod::Known)
        );
        assert_eq!(
            spell_preparation_method(&[], &[row(1, Some(6)), row(2, Some(8))]),
            Some(SpellPreparationMethod::Spellbook)
        );
    }

    #[test]
    fn test_spellbook_progression_is_synthesized() {
        let record = class(
            r#"<class><name>Wizard</name><hd>6</hd><spellAbility>Intelligence</spellAbility>
                <autolevel level="1"><slots>3,2</slots>
                  <feature><name>Spellcasting</name><text>You have a spellbook containing spells.</text></feature>
                </autolevel>
                <autolevel level="2"><slots>3,3</slots></autolevel>
                <autolevel level="3"><slots>3,4,2</slots></autolevel>
                <autolevel level="4"><slots>4,4,3</slots></autolevel>
                <autolevel level="5"><slots>4,4,3,2</slots></autolevel></class>"#,
        );
        assert_eq!(record.spell_preparation_method, Some(SpellPreparationMethod::Spellbook));
        let known: Vec<Option<u32>> = record
            .spell_progression
            .unwrap()
            .iter()
            .map(|row| row.spells_known)
            .collect();
        assert_eq!(known, vec![Some(6), Some(8), Some(10), Some(12), Some(14)]);
    }

    #[test]
    fn test_prepared_casters_have_no_spells_known() {
        let record = class(
            r#"<class><name>Cleric</name><spellAbility>Wisdom</spellAbility>
                <autolevel level="1"><slots>3,2</slots>
                  <feature><name>Spellcasting</name><text>You can cast cleric spells.</text></feature>
                </autolevel></class>"#,
        );
        assert_eq!(record.spell_preparation_method, Some(SpellPreparationMethod::Prepared));
        assert_eq!(record.spell_progression.unwrap()[0].spells_known, None);
    }

    #[test]
    fn test_domain_spell_table_and_resource_cost() {
        let record = class(
            r#"<class><name>Cleric</name>
                <autolevel level="1">
                  <feature optional="YES"><name>Divine Domain: Life Domain</name><text>The Life domain focuses on positive energy.</text><text>Life Domain Spells:</text><text>Cleric Level | Spells</text><text>1st | bless, cure wounds</text><text>3rd | lesser restoration, spiritual weapon</text><text /><text>Source: Player's Handbook (2014) p. 60</text></feature>
                </autolevel>
                <autolevel level="3">
                  <feature optional="YES"><name>Maneuvers</name><text>To use a maneuver, you expend one superiority die.</text></feature>
                </autolevel></class>"#,
        );
        let domain = record
            .subclasses
            .iter()
            .flat_map(|s| s.features.iter())
            .chain(record.features.iter())
            .find(|f| f.name == "Divine Domain: Life Domain")
            .unwrap();
        let table = domain.spell_table.as_ref().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].level, 3);
        assert_eq!(table[1].spells, vec!["lesser restoration", "spiritual weapon"]);
        assert_eq!(domain.resource_cost, None);

        let maneuvers = record
            .subclasses
            .iter()
            .flat_map(|s| s.features.iter())
            .chain(record.features.iter())
            .find(|f| f.name == "Maneuvers")
            .unwrap();
        assert_eq!(maneuvers.spell_table, None);
        let cost = maneuvers.resource_cost.as_ref().unwrap();
        assert_eq!(cost.resource_type, crate::ingestion::concerns::ResourceType::SuperiorityDie);
        assert_eq!(cost.cost, Some(1));
    }
}
