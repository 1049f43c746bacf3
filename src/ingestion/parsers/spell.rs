//! Spell Parser
//!
//! One [`SpellRecord`] per `<spell>` element. The `<text>` blocks are split into
//! the description proper, the "At Higher Levels:" paragraph and the source
//! citations; `<roll>` elements become [`SpellEffect`]s whose scaling comes
//! from the roll's `level` attribute and the higher-levels text.
//!
//! # Example
//!
//! ```ignore
//! let spells = SpellParser::new().parse(xml)?;
//! assert_eq!(spells[0].effects[0].scaling_type, ScalingType::CharacterLevel);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::common::{entity_name, EntityParser};
use crate::ingestion::concerns::projectile_scaling::{
    parse_character_level_beam_scaling, parse_projectile_scaling, ProjectileScaling,
};
use crate::ingestion::concerns::random_tables::{parse_random_tables, RandomTable};
use crate::ingestion::concerns::resource_costs::{parse_resource_cost, ResourceCost};
use crate::ingestion::concerns::saving_throws::{parse_spell_saving_throws, SpellSavingThrow};
use crate::ingestion::concerns::scaling_increment::parse_scaling_increment;
use crate::ingestion::concerns::source_citations::{extract_citations, SourceCitation};
use crate::ingestion::concerns::vocabulary::BASE_CLASSES;
use crate::ingestion::xml::Element;

/// Character levels at which cantrip damage steps up.
const CANTRIP_TIERS: &[i32] = &[0, 5, 11, 17];

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    Damage,
    Healing,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingType {
    /// Cantrip tiers at character levels 5, 11 and 17
    CharacterLevel,
    SpellSlotLevel,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellEffect {
    pub effect_type: EffectType,
    pub description: String,
    /// "Acid" for a roll described as "Acid Damage"
    pub damage_type_name: Option<String>,
    pub dice_formula: String,
    pub scaling_type: ScalingType,
    pub min_character_level: Option<i32>,
    pub min_spell_slot: Option<i32>,
    pub scaling_increment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projectiles: Option<ProjectileScaling>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellRecord {
    pub name: String,
    pub level: u32,
    pub school: String,
    pub casting_time: String,
    pub range: String,
    /// Component letters with the material parenthetical removed ("V, S, M")
    pub components: String,
    pub material_components: Option<String>,
    pub duration: String,
    pub needs_concentration: bool,
    pub is_ritual: bool,
    pub description: String,
    pub higher_levels: Option<String>,
    /// Base classes and "Class (Subclass)" entries
    pub classes: Vec<String>,
    /// Everything else in the class list ("Ritual Caster", "Touch Spells")
    pub tags: Vec<String>,
    pub sources: Vec<SourceCitation>,
    pub effects: Vec<SpellEffect>,
    pub saving_throws: Vec<SpellSavingThrow>,
    pub random_tables: Vec<RandomTable>,
    /// Ki or sorcery points spent by spells granted through class features
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_cost: Option<ResourceCost>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static MATERIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"M \(([^)]+)\)").expect("Failed to compile material regex"));

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]+\)").expect("Failed to compile parenthetical regex"));

static SCHOOL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^School:\s*[^,]+,\s*").expect("Failed to compile school prefix regex"));

static HIGHER_LEVELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n*At Higher Levels:\s*").expect("Failed to compile higher levels regex")
});

static DAMAGE_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\w+)\s+damage$").expect("Failed to compile damage type regex"));

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SpellParser;

impl SpellParser {
    pub fn new() -> Self {
        Self
    }
}

impl EntityParser for SpellParser {
    type Record = SpellRecord;
    const ELEMENT: &'static str = "spell";

    fn parse_element(&self, element: &Element) -> Option<SpellRecord> {
        let name = entity_name(element)?;
        let level = element.child_int("level").unwrap_or(0).max(0) as u32;

        let raw_components = element.child_text_or_empty("components");
        let (components, material_components) = split_components(raw_components);
        let duration = element.child_text_or_empty("duration").to_string();
        let (classes, tags) = split_classes(element.child_text_or_empty("classes"));
        let body = parse_text_blocks(element);

        let mut effects = parse_effects(element, level, body.higher_levels.as_deref());

        let projectiles = parse_projectile_scaling(body.higher_levels.as_deref(), &body.description)
            .or_else(|| {
                if level == 0 {
                    parse_character_level_beam_scaling(&body.description)
                } else {
                    None
                }
            });
        if let Some(scaling) = projectiles {
            if let Some(first_damage) = effects.iter_mut().find(|e| e.effect_type == EffectType::Damage) {
                first_damage.projectiles = Some(scaling);
            }
        }

        tracing::debug!(spell = %name, effects = effects.len(), "Parsed spell");

        Some(SpellRecord {
            name,
            level,
            school: element.child_text_or_empty("school").to_string(),
            casting_time: element.child_text_or_empty("time").to_string(),
            range: element.child_text_or_empty("range").to_string(),
            components,
            material_components,
            needs_concentration: duration.to_lowercase().contains("concentration"),
            duration,
            is_ritual: element.child_is_yes("ritual"),
            saving_throws: parse_spell_saving_throws(&body.description),
            random_tables: parse_random_tables(&body.description),
            resource_cost: parse_resource_cost(Some(raw_components), &body.description),
            description: body.description,
            higher_levels: body.higher_levels,
            classes,
            tags,
            sources: body.sources,
            effects,
        })
    }
}

// ============================================================================
// Fields
// ============================================================================

/// "V, S, M (a pinch of soot)" -> ("V, S, M", Some("a pinch of soot"))
pub fn split_components(raw: &str) -> (String, Option<String>) {
    match MATERIAL.captures(raw) {
        Some(caps) => (
            PARENTHETICAL.replace_all(raw, "").trim().to_string(),
            Some(caps[1].to_string()),
        ),
        None => (raw.trim().to_string(), None),
    }
}

/// Split the class list into classes and tags, dropping a leading "School: X,".
pub fn split_classes(raw: &str) -> (Vec<String>, Vec<String>) {
    let stripped = SCHOOL_PREFIX.replace(raw, "");
    stripped
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .partition(|part| part.contains('(') || BASE_CLASSES.contains(&part.as_str()))
}

struct SpellBody {
    description: String,
    higher_levels: Option<String>,
    sources: Vec<SourceCitation>,
}

fn parse_text_blocks(element: &Element) -> SpellBody {
    let mut paragraphs = Vec::new();
    let mut higher_levels = None;
    let mut sources = Vec::new();

    for text_el in element.children_named("text") {
        let mut content = text_el.text().to_string();

        if content.contains("Source:") {
            let extraction = extract_citations(&content);
            sources = extraction.citations;
            content = extraction.cleaned;
        }

        if let Some(found) = HIGHER_LEVELS.find(&content) {
            let rest = &content[found.end()..];
            let end = rest.find("\n\n").unwrap_or(rest.len());
            higher_levels = Some(rest[..end].trim().to_string());
            content = format!("{}{}", &content[..found.start()], &rest[end..]);
        }

        if !content.trim().is_empty() {
            paragraphs.push(content);
        }
    }

    SpellBody {
        description: paragraphs.join("\n\n").trim().to_string(),
        higher_levels,
        sources,
    }
}

fn effect_type(description: &str) -> EffectType {
    let lower = description.to_lowercase();
    if lower.contains("damage") {
        EffectType::Damage
    } else if lower.contains("heal") || lower.contains("regain") {
        EffectType::Healing
    } else {
        EffectType::Other
    }
}

/// "Acid Damage" -> "Acid"
pub fn damage_type_name(description: &str) -> Option<String> {
    let caps = DAMAGE_TYPE.captures(description.trim())?;
    let lower = caps[1].to_lowercase();
    let mut chars = lower.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().collect::<String>() + chars.as_str())
}

/// One effect per `<roll>`. Cantrip rolls at the tier levels scale by
/// character level; any other leveled roll scales by slot level.
pub fn parse_effects(element: &Element, spell_level: u32, higher_levels: Option<&str>) -> Vec<SpellEffect> {
    let increment = parse_scaling_increment(higher_levels);

    element
        .children_named("roll")
        .map(|roll| {
            let description = roll.attr("description").unwrap_or_default().to_string();
            let roll_level = roll.attr("level").and_then(|l| l.trim().parse::<i32>().ok());

            let (scaling_type, min_character_level, min_spell_slot) = match roll_level {
                Some(l) if spell_level == 0 && CANTRIP_TIERS.contains(&l) => {
                    (ScalingType::CharacterLevel, Some(l), None)
                }
                Some(l) => (ScalingType::SpellSlotLevel, None, Some(l)),
                None => (ScalingType::None, None, None),
            };

            let effect_type = effect_type(&description);
            let scaling_increment = match effect_type {
                EffectType::Damage | EffectType::Healing => increment.clone(),
                EffectType::Other => None,
            };

            SpellEffect {
                effect_type,
                damage_type_name: damage_type_name(&description),
                description,
                dice_formula: roll.text().trim().to_string(),
                scaling_type,
                min_character_level,
                min_spell_slot,
                scaling_increment,
                projectiles: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(xml: &str) -> SpellRecord {
        SpellParser::new()
            .parse(&format!("<compendium>{xml}</compendium>"))
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_components_and_concentration() {
        let s = spell(
            "<spell><name>Bless</name><level>1</level><school>EN</school><components>V, S, M (a sprinkling of holy water)</components><duration>Concentration, up to 1 minute</duration><classes>School: Enchantment, Cleric, Paladin, Cleric (Peace)</classes><text>You bless up to three creatures.</text></spell>",
        );
        assert_eq!(s.components, "V, S, M");
        assert_eq!(s.material_components.as_deref(), Some("a sprinkling of holy water"));
        assert!(s.needs_concentration);
        assert!(!s.is_ritual);
        assert_eq!(s.classes, vec!["Cleric", "Paladin", "Cleric (Peace)"]);
        assert!(s.tags.is_empty());
    }

    #[test]
    fn test_classes_and_tags() {
        let (classes, tags) = split_classes("Wizard, Ritual Caster, Touch Spells, Fighter (Eldritch Knight)");
        assert_eq!(classes, vec!["Wizard", "Fighter (Eldritch Knight)"]);
        assert_eq!(tags, vec!["Ritual Caster", "Touch Spells"]);
    }

    #[test]
    fn test_higher_levels_and_sources() {
        let s = spell(
            "<spell><name>Burning Hands</name><level>1</level><text>Each creature in a 15-foot cone must make a Dexterity saving throw. A creature takes 3d6 fire damage on a failed save, or half as much damage on a successful one.</text><text /><text>At Higher Levels: When you cast this spell using a spell slot of 2nd level or higher, the damage increases by 1d6 for each slot level above 1st.</text><text /><text>Source: Player's Handbook (2014) p. 220</text><roll description=\"Fire Damage\" level=\"1\">3d6</roll><roll description=\"Fire Damage\" level=\"2\">4d6</roll></spell>",
        );
        assert!(s.higher_levels.as_deref().unwrap().starts_with("When you cast"));
        assert!(!s.description.contains("At Higher Levels"));
        assert!(!s.description.contains("Source:"));
        assert_eq!(s.sources[0].code, "PHB");
        assert_eq!(s.effects.len(), 2);
        assert_eq!(s.effects[0].scaling_type, ScalingType::SpellSlotLevel);
        assert_eq!(s.effects[0].min_spell_slot, Some(1));
        assert_eq!(s.effects[0].damage_type_name.as_deref(), Some("Fire"));
        assert_eq!(s.effects[0].scaling_increment.as_deref(), Some("1d6"));
        assert_eq!(s.saving_throws[0].ability_code, "DEX");
    }

    #[test]
    fn test_cantrip_character_level_scaling() {
        let s = spell(
            "<spell><name>Fire Bolt</name><level>0</level><text>You hurl a mote of fire.</text><roll description=\"Fire Damage\" level=\"0\">1d10</roll><roll description=\"Fire Damage\" level=\"5\">2d10</roll></spell>",
        );
        assert_eq!(s.effects[1].scaling_type, ScalingType::CharacterLevel);
        assert_eq!(s.effects[1].min_character_level, Some(5));
        assert_eq!(s.effects[1].min_spell_slot, None);
    }

    #[test]
    fn test_projectiles_on_first_damage_effect() {
        let s = spell(
            "<spell><name>Magic Missile</name><level>1</level><text>You create three glowing darts of magical force.</text><text>At Higher Levels: When you cast this spell using a spell slot of 2nd level or higher, the spell creates one more dart for each slot level above 1st.</text><roll description=\"Force Damage\" level=\"1\">1d4+1</roll><roll description=\"Force Damage\" level=\"2\">1d4+1</roll></spell>",
        );
        let projectiles = s.effects[0].projectiles.as_ref().unwrap();
        assert_eq!(projectiles.projectile_count, 3);
        assert_eq!(projectiles.projectile_name, "dart");
        assert!(s.effects[1].projectiles.is_none());
    }

    #[test]
    fn test_healing_and_other_effects() {
        assert_eq!(effect_type("Healing"), EffectType::Healing);
        assert_eq!(effect_type("Temporary Hit Points"), EffectType::Other);
        assert_eq!(damage_type_name("Temporary Hit Points"), None);
    }

    #[test]
    fn test_ritual_flag() {
        let s = spell("<spell><name>Alarm</name><level>1</level><ritual>YES</ritual></spell>");
        assert!(s.is_ritual);
        assert!(s.effects.is_empty());
    }

    #[test]
    fn test_ki_point_component_cost() {
        let s = spell(
            "<spell><name>Fangs of the Fire Snake</name><level>0</level><components>V, S, M (1 ki point)</components><text>When you use the Attack action on your turn, you can spend 1 ki point to cause tendrils of flame to stretch out from your fists and feet.</text></spell>",
        );
        let cost = s.resource_cost.unwrap();
        assert_eq!(cost.resource_type, crate::ingestion::concerns::ResourceType::KiPoints);
        assert_eq!(cost.cost, Some(1));
        assert_eq!(s.components, "V, S, M");
    }

    #[test]
    fn test_ordinary_spells_have_no_resource_cost() {
        let s = spell(
            "<spell><name>Light</name><level>0</level><components>V, M (a firefly or phosphorescent moss)</components><text>You touch one object.</text></spell>",
        );
        assert_eq!(s.resource_cost, None);
    }
}
