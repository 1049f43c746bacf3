//! Background Parser
//!
//! A `<background>` lists its skill proficiencies as a comma separated
//! `<proficiency>` element. Everything else (tool proficiencies, languages,
//! starting equipment, the source citation) sits in bulleted lines of the
//! first trait, conventionally named "Description":
//!
//! ```text
//! • Skill Proficiencies: Insight, Religion
//! • Languages: Two of your choice
//! • Equipment: A holy symbol, a belt pouch containing 15 gp
//! ```
//!
//! Trait prose also carries the d6/d8 personality tables, which are parsed
//! from every trait.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::common::{element_text, entity_name, parse_trait_elements, split_list, EntityParser, TraitRecord};
use crate::ingestion::concerns::item_proficiencies::{infer_proficiency_type, ProficiencyType};
use crate::ingestion::concerns::languages::extract_languages_from_text;
use crate::ingestion::concerns::random_tables::{parse_random_tables, RandomTable};
use crate::ingestion::concerns::source_citations::{parse_citations, SourceCitation};
use crate::ingestion::concerns::vocabulary::{match_language, slugify, word_to_number};
use crate::ingestion::xml::Element;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundProficiency {
    pub name: String,
    #[serde(rename = "type")]
    pub proficiency_type: ProficiencyType,
    pub is_choice: bool,
    pub quantity: u32,
    pub grants: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundLanguage {
    /// Language slug, `None` for a choice
    pub slug: Option<String>,
    pub is_choice: bool,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub item_name: String,
    pub quantity: u32,
    pub is_choice: bool,
    /// "one of your choice"
    pub choice_description: Option<String>,
}

/// A roll table together with the trait it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundTable {
    pub trait_name: String,
    #[serde(flatten)]
    pub table: RandomTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundRecord {
    pub name: String,
    pub proficiencies: Vec<BackgroundProficiency>,
    /// Traits with category `feature`, `characteristics`, `flavor`, or none
    /// for the description trait
    pub traits: Vec<TraitRecord>,
    pub sources: Vec<SourceCitation>,
    pub languages: Vec<BackgroundLanguage>,
    pub equipment: Vec<EquipmentItem>,
    pub random_tables: Vec<BackgroundTable>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

static LANGUAGES_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)•\s*Languages:\s*(.+?)\s*$").expect("Failed to compile languages line regex")
});

static TOOLS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)•\s*Tool\s+Proficiencies:\s*(.+?)\s*$")
        .expect("Failed to compile tool proficiencies regex")
});

static EQUIPMENT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)•\s*Equipment:\s*(.+?)(?:\n\n|\n[A-Z•]|$)")
        .expect("Failed to compile equipment regex")
});

static ONE_TYPE_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(one|two)\s+types?\s+of\s+(.+)$").expect("Failed to compile tool choice regex")
});

static CHOICE_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(any\s+)?(one|two|three|four)\b.*choice")
        .expect("Failed to compile choice count regex")
});

static CHOICE_PARENTHETICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\(([^)]*choice[^)]*)\)").expect("Failed to compile choice note regex")
});

static LEADING_QUANTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+").expect("Failed to compile quantity regex"));

static ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:and\s+)?(?:a|an|the)\s+").expect("Failed to compile article regex"));

static SET_OF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*set\s+of\s+").expect("Failed to compile set-of regex"));

static CONTAINING_GOLD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?)\s+containing\s+(\d+)\s+gp$").expect("Failed to compile coin pouch regex")
});

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundParser;

impl BackgroundParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_background(&self, element: &Element) -> Option<BackgroundRecord> {
        let name = entity_name(element)?;
        let description = element
            .child("trait")
            .map(element_text)
            .unwrap_or_default();

        let mut proficiencies = parse_proficiency_list(element.child_text_or_empty("proficiency"));
        proficiencies.extend(parse_tool_proficiencies(&description));

        let mut traits = parse_trait_elements(element, "trait");
        for background_trait in &mut traits {
            background_trait.category = trait_category(&background_trait.name).map(str::to_string);
        }
        let random_tables = traits
            .iter()
            .flat_map(|t| {
                parse_random_tables(&t.description)
                    .into_iter()
                    .map(move |table| BackgroundTable {
                        trait_name: t.name.clone(),
                        table,
                    })
            })
            .collect();

        let record = BackgroundRecord {
            proficiencies,
            sources: parse_citations(&description),
            languages: parse_languages(&description),
            equipment: parse_equipment(&description),
            traits,
            random_tables,
            name,
        };
        tracing::debug!(
            background = %record.name,
            proficiencies = record.proficiencies.len(),
            equipment = record.equipment.len(),
            "Parsed background"
        );
        Some(record)
    }
}

impl EntityParser for BackgroundParser {
    type Record = BackgroundRecord;
    const ELEMENT: &'static str = "background";

    fn parse_element(&self, element: &Element) -> Option<BackgroundRecord> {
        self.parse_background(element)
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Background proficiencies are skills unless the name says tool or language.
fn background_proficiency_type(name: &str) -> ProficiencyType {
    match infer_proficiency_type(name) {
        kind @ (ProficiencyType::Tool | ProficiencyType::Language) => kind,
        _ => ProficiencyType::Skill,
    }
}

/// "Insight, Religion"
pub fn parse_proficiency_list(text: &str) -> Vec<BackgroundProficiency> {
    split_list(text)
        .into_iter()
        .map(|name| BackgroundProficiency {
            proficiency_type: background_proficiency_type(&name),
            name,
            is_choice: false,
            quantity: 1,
            grants: true,
        })
        .collect()
}

/// "• Tool Proficiencies: One type of gaming set, thieves' tools" style lines.
pub fn parse_tool_proficiencies(text: &str) -> Vec<BackgroundProficiency> {
    let Some(caps) = TOOLS_LINE.captures(text) else {
        return Vec::new();
    };
    let tools = caps[1].trim_end_matches('.');

    if let Some(choice) = ONE_TYPE_OF.captures(tools) {
        return vec![BackgroundProficiency {
            name: choice[2].trim().to_string(),
            proficiency_type: ProficiencyType::Tool,
            is_choice: true,
            quantity: word_to_number(&choice[1]).unwrap_or(1),
            grants: true,
        }];
    }

    split_list(tools)
        .into_iter()
        .map(|name| BackgroundProficiency {
            name,
            proficiency_type: ProficiencyType::Tool,
            is_choice: false,
            quantity: 1,
            grants: true,
        })
        .collect()
}

/// "• Languages: Two of your choice", "• Languages: Elvish"
pub fn parse_languages(text: &str) -> Vec<BackgroundLanguage> {
    let Some(caps) = LANGUAGES_LINE.captures(text) else {
        return Vec::new();
    };
    let languages = caps[1].trim_end_matches('.');

    if let Some(choice) = CHOICE_COUNT.captures(languages) {
        return vec![BackgroundLanguage {
            slug: None,
            is_choice: true,
            quantity: word_to_number(&choice[2]).unwrap_or(1),
        }];
    }

    if let Some(language) = match_language(languages) {
        return vec![BackgroundLanguage {
            slug: Some(slugify(language)),
            is_choice: false,
            quantity: 1,
        }];
    }

    extract_languages_from_text(languages)
        .into_iter()
        .map(|grant| BackgroundLanguage {
            slug: grant.slug,
            is_choice: grant.is_choice,
            quantity: 1,
        })
        .collect()
}

/// Split on commas outside parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Starting equipment from the "• Equipment:" line. A belt pouch
/// "containing 15 gp" yields the pouch and a separate gp entry.
pub fn parse_equipment(text: &str) -> Vec<EquipmentItem> {
    let Some(caps) = EQUIPMENT_BLOCK.captures(text) else {
        return Vec::new();
    };
    let equipment = caps[1].trim().trim_end_matches('.');

    let mut items = Vec::new();
    for part in split_top_level(equipment) {
        let part = part.trim();
        if part.is_empty() || part.eq_ignore_ascii_case("and") {
            continue;
        }

        let choice_description = CHOICE_PARENTHETICAL
            .captures(part)
            .map(|c| c[1].trim().to_string());
        let without_choice = CHOICE_PARENTHETICAL.replace(part, "");
        let mut remainder = without_choice.trim();
        if let Some(rest) = remainder.strip_prefix("and ") {
            remainder = rest.trim();
        }

        let mut quantity = 1;
        if let Some(q) = LEADING_QUANTITY.captures(remainder) {
            quantity = q[1].parse().unwrap_or(1);
            remainder = remainder[q[0].len()..].trim();
        }

        let without_article = ARTICLE.replace(remainder, "");
        let item_name = SET_OF.replace(&without_article, "").trim().to_string();
        if item_name.is_empty() {
            continue;
        }

        if let Some(pouch) = CONTAINING_GOLD.captures(&item_name) {
            items.push(EquipmentItem {
                item_name: pouch[1].trim().to_string(),
                quantity,
                is_choice: choice_description.is_some(),
                choice_description,
            });
            items.push(EquipmentItem {
                item_name: "gp".to_string(),
                quantity: pouch[2].parse().unwrap_or(0),
                is_choice: false,
                choice_description: None,
            });
            continue;
        }

        items.push(EquipmentItem {
            item_name,
            quantity,
            is_choice: choice_description.is_some(),
            choice_description,
        });
    }
    items
}

fn trait_category(name: &str) -> Option<&'static str> {
    if name == "Description" {
        None
    } else if name.starts_with("Feature:") {
        Some("feature")
    } else if name == "Suggested Characteristics" {
        Some("characteristics")
    } else {
        Some("flavor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACOLYTE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<compendium version="5">
  <background>
    <name>Acolyte</name>
    <proficiency>Insight, Religion</proficiency>
    <trait>
      <name>Description</name>
      <text>You have spent your life in the service of a temple.

• Skill Proficiencies: Insight, Religion
• Languages: Two of your choice
• Equipment: A holy symbol (a gift to you when you entered the priesthood), a prayer book or prayer wheel, 5 sticks of incense, vestments, a set of common clothes, and a belt pouch containing 15 gp

Source: Player's Handbook (2014) p. 127</text>
    </trait>
    <trait>
      <name>Feature: Shelter of the Faithful</name>
      <text>As an acolyte, you command the respect of those who share your faith.</text>
    </trait>
    <trait>
      <name>Suggested Characteristics</name>
      <text>Acolytes are shaped by their experience in temples.

d8 | Personality Trait
1 | I idolize a particular hero of my faith.
2 | I can find common ground between the fiercest enemies.</text>
    </trait>
  </background>
</compendium>"#;

    #[test]
    fn test_acolyte() {
        let backgrounds = BackgroundParser::new().parse(ACOLYTE).unwrap();
        assert_eq!(backgrounds.len(), 1);
        let acolyte = &backgrounds[0];
        assert_eq!(acolyte.name, "Acolyte");

        assert_eq!(acolyte.proficiencies.len(), 2);
        assert_eq!(acolyte.proficiencies[0].name, "Insight");
        assert_eq!(acolyte.proficiencies[0].proficiency_type, ProficiencyType::Skill);

        assert_eq!(acolyte.sources.len(), 1);
        assert_eq!(acolyte.sources[0].code, "PHB");
        assert_eq!(
            acolyte.languages,
            vec![BackgroundLanguage { slug: None, is_choice: true, quantity: 2 }]
        );

        let categories: Vec<_> = acolyte.traits.iter().map(|t| t.category.as_deref()).collect();
        assert_eq!(categories, vec![None, Some("feature"), Some("characteristics")]);
        assert!(!acolyte.traits[0].description.contains("Source:"));

        assert_eq!(acolyte.random_tables.len(), 1);
        assert_eq!(acolyte.random_tables[0].trait_name, "Suggested Characteristics");
        assert_eq!(acolyte.random_tables[0].table.entries.len(), 2);
    }

    #[test]
    fn test_equipment() {
        let items = parse_equipment(
            "• Equipment: A holy symbol (a gift to you when you entered the priesthood), a prayer book or prayer wheel, 5 sticks of incense, vestments, a set of common clothes, and a belt pouch containing 15 gp\n\nSource: x",
        );
        let names: Vec<_> = items.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "holy symbol (a gift to you when you entered the priesthood)",
                "prayer book or prayer wheel",
                "sticks of incense",
                "vestments",
                "common clothes",
                "belt pouch",
                "gp",
            ]
        );
        assert_eq!(items[2].quantity, 5);
        assert_eq!(items[6].quantity, 15);
    }

    #[test]
    fn test_equipment_choice() {
        let items = parse_equipment(
            "• Equipment: A set of artisan's tools (one of your choice), a letter of introduction from your guild",
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_name, "artisan's tools");
        assert!(items[0].is_choice);
        assert_eq!(items[0].choice_description.as_deref(), Some("one of your choice"));
        assert!(!items[1].is_choice);
    }

    #[test]
    fn test_tool_proficiencies() {
        let choice = parse_tool_proficiencies("• Tool Proficiencies: One type of artisan's tools\n");
        assert_eq!(choice.len(), 1);
        assert!(choice[0].is_choice);
        assert_eq!(choice[0].name, "artisan's tools");

        let fixed = parse_tool_proficiencies("• Tool Proficiencies: Navigator's tools, vehicles (water)");
        assert_eq!(fixed.len(), 2);
        assert!(fixed.iter().all(|p| p.proficiency_type == ProficiencyType::Tool && !p.is_choice));
    }

    #[test]
    fn test_fixed_language() {
        let languages = parse_languages("• Languages: Elvish\n• Equipment: A lute");
        assert_eq!(languages[0].slug.as_deref(), Some("elvish"));
        assert!(!languages[0].is_choice);
        assert!(parse_languages("No bullet here").is_empty());
    }

    #[test]
    fn test_proficiency_typing() {
        let profs = parse_proficiency_list("Deception, Thieves' Tools, Disguise Kit");
        let types: Vec<_> = profs.iter().map(|p| p.proficiency_type).collect();
        assert_eq!(types, vec![ProficiencyType::Skill, ProficiencyType::Tool, ProficiencyType::Tool]);
    }
}
