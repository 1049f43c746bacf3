//! Subclass Partitioning
//!
//! Finds the subclasses a class document describes and moves their features,
//! counters and optional spellcasting out of the base class. A subclass is
//! announced three ways:
//!
//! - an archetype introduction, `Martial Archetype: Battle Master`
//! - a trailing parenthetical on a feature, `Combat Superiority (Battle Master)`
//! - the `<subclass>` of a `<counter>`
//!
//! Membership is anchored: a feature belongs to a subclass only through the
//! exact introduction or a trailing `(<Subclass>)`, so "Spell Thief (Arcane
//! Trickster)" never lands in "Thief".

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::spell_progression::{OptionalSpellcasting, SpellProgression};
use super::{ClassCounter, ClassFeature};

static ARCHETYPE_INTRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Martial Archetype|Primal Path|Monastic Tradition|Otherworldly Patron|Divine Domain|Arcane Tradition|Sacred Oath|Ranger Archetype|Roguish Archetype|Sorcerous Origin|Bard College|Druid Circle|College of|Artificer Specialist):\s*(.+)$",
    )
    .expect("Failed to compile archetype intro regex")
});

static TRAILING_PARENTHETICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([^)]+)\)$").expect("Failed to compile trailing parenthetical regex")
});

/// Parentheticals that qualify a feature rather than name a subclass.
static NOT_A_SUBCLASS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^CR\s+\d+",
        r"(?i)^\d+\s*/\s*(?:rest|day)",
        r"(?i)^\d+(?:st|nd|rd|th)\b",
        r"(?i)\buses?\b",
        r"(?i)^\d+\s+slots?",
        r"(?i)^level\s+\d+",
        r"(?i)^\d+\s+times?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile subclass false positive regex"))
    .collect()
});

const QUALIFIERS: &[&str] = &["revised", "alternative", "optional", "variant"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubclassRecord {
    pub name: String,
    pub features: Vec<ClassFeature>,
    pub counters: Vec<ClassCounter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_progression: Option<Vec<SpellProgression>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spellcasting_ability: Option<String>,
}

/// Result of splitting a class into base and subclass parts.
#[derive(Debug, Clone, Default)]
pub struct SubclassPartition {
    pub subclasses: Vec<SubclassRecord>,
    /// Features assigned to no subclass, in original order
    pub base_features: Vec<ClassFeature>,
    /// Label of the first archetype introduction ("Martial Archetype")
    pub archetype: Option<String>,
}

fn parenthetical_subclass(feature_name: &str) -> Option<&str> {
    let candidate = TRAILING_PARENTHETICAL.captures(feature_name)?.get(1)?.as_str().trim();

    if NOT_A_SUBCLASS.iter().any(|re| re.is_match(candidate))
        || QUALIFIERS.contains(&candidate.to_lowercase().as_str())
        || candidate.parse::<f64>().is_ok()
        || !candidate.starts_with(|c: char| c.is_ascii_uppercase())
    {
        return None;
    }

    Some(candidate)
}

/// Subclass names announced by the features and counters, unique and sorted,
/// plus the first archetype label seen.
pub fn detect_subclass_names(
    features: &[ClassFeature],
    counters: &[ClassCounter],
) -> (Vec<String>, Option<String>) {
    let mut names = BTreeSet::new();
    let mut archetype = None;

    for feature in features {
        if let Some(caps) = ARCHETYPE_INTRO.captures(&feature.name) {
            archetype.get_or_insert_with(|| caps[1].trim().to_string());
            names.insert(caps[2].trim().to_string());
        }
        if let Some(subclass) = parenthetical_subclass(&feature.name) {
            names.insert(subclass.to_string());
        }
    }

    for counter in counters {
        if let Some(subclass) = counter.subclass.as_deref().filter(|s| !s.is_empty()) {
            names.insert(subclass.to_string());
        }
    }

    (names.into_iter().collect(), archetype)
}

/// Whether a feature is the subclass's introduction or carries its trailing
/// parenthetical.
pub fn feature_belongs_to_subclass(feature_name: &str, subclass: &str) -> bool {
    if let Some(caps) = ARCHETYPE_INTRO.captures(feature_name) {
        if caps[2].trim().eq_ignore_ascii_case(subclass) {
            return true;
        }
    }

    let suffix = format!("({})", subclass.to_lowercase());
    feature_name.trim_end().to_lowercase().ends_with(&suffix)
}

/// Split features and counters into base class and subclass records.
pub fn partition_subclasses(
    features: Vec<ClassFeature>,
    counters: &[ClassCounter],
    optional_spellcasting: Option<OptionalSpellcasting>,
) -> SubclassPartition {
    let (names, archetype) = detect_subclass_names(&features, counters);
    let mut claimed = vec![false; features.len()];
    let mut subclasses = Vec::with_capacity(names.len());

    for name in names {
        let mut subclass_features = Vec::new();
        for (index, feature) in features.iter().enumerate() {
            if feature_belongs_to_subclass(&feature.name, &name) {
                subclass_features.push(feature.clone());
                claimed[index] = true;
            }
        }

        let subclass_counters = counters
            .iter()
            .filter(|c| c.subclass.as_deref() == Some(name.as_str()))
            .cloned()
            .collect();

        let (spell_progression, spellcasting_ability) = match &optional_spellcasting {
            Some(optional) if optional.subclass == name => (
                Some(optional.spell_progression.clone()),
                optional.spellcasting_ability.clone(),
            ),
            _ => (None, None),
        };

        subclasses.push(SubclassRecord {
            name,
            features: subclass_features,
            counters: subclass_counters,
            spell_progression,
            spellcasting_ability,
        });
    }

    let base_features = features
        .into_iter()
        .zip(claimed)
        .filter(|(_, claimed)| !claimed)
        .map(|(feature, _)| feature)
        .collect();

    SubclassPartition {
        subclasses,
        base_features,
        archetype,
    }
}
