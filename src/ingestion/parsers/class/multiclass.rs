//! Multiclass ability score minimums from the "Multiclass <Class>" feature.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ClassFeature;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticlassRequirement {
    /// Lowercase ability name ("strength")
    pub ability: String,
    pub minimum: u32,
    /// All requirements of the class form one OR group when set
    pub is_alternative: bool,
}

static MINIMUM_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Ability Score Minimum:(.+?)(?:Proficiencies Gained:|$)")
        .expect("Failed to compile ability minimum section regex")
});

static AT_LEAST_ONE_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)at least 1 of").expect("Failed to compile at-least-one regex")
});

/// "• Strength 13, or" but not ", or to take a level"
static BULLET_OR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)•\s*(?:Strength|Dexterity|Constitution|Intelligence|Wisdom|Charisma)\s+\d+\s*,\s*or\b",
    )
    .expect("Failed to compile bullet-or regex")
});

static ABILITY_BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)•\s*(Strength|Dexterity|Constitution|Intelligence|Wisdom|Charisma)\s+(\d+)")
        .expect("Failed to compile ability bullet regex")
});

/// Requirements listed by the class's own multiclass feature, if it has one.
pub fn parse_multiclass_requirements(
    features: &[ClassFeature],
    class_name: &str,
) -> Vec<MulticlassRequirement> {
    let feature_name = format!("Multiclass {}", class_name);
    let Some(feature) = features.iter().find(|f| f.name == feature_name) else {
        return Vec::new();
    };

    let Some(section) = MINIMUM_SECTION.captures(&feature.description) else {
        return Vec::new();
    };
    let section = &section[1];

    let is_alternative = AT_LEAST_ONE_OF.is_match(section) || BULLET_OR.is_match(section);

    ABILITY_BULLET
        .captures_iter(section)
        .filter_map(|caps| {
            Some(MulticlassRequirement {
                ability: caps[1].to_lowercase(),
                minimum: caps[2].parse().ok()?,
                is_alternative,
            })
        })
        .collect()
}
