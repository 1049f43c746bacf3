//! Resource Costs
//!
//! Optional class features (elemental disciplines, metamagic, maneuvers) spend
//! a class resource pool. The cost is printed either as a component
//! parenthetical, `V, S, M (6 ki points)`, or in the description: "expend one
//! superiority die", or a variable cost "equal to the spell's level".
//!
//! Components are checked before the description.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::word_to_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    KiPoints,
    SorceryPoints,
    SuperiorityDie,
    Charges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub resource_type: ResourceType,
    /// Fixed cost; `None` when the cost is a formula
    pub cost: Option<u32>,
    pub formula: Option<String>,
}

impl ResourceCost {
    fn fixed(resource_type: ResourceType, cost: u32) -> Self {
        Self {
            resource_type,
            cost: Some(cost),
            formula: None,
        }
    }
}

/// Variable cost: the level of the spell being altered
pub const SPELL_LEVEL_FORMULA: &str = "spell_level";

// ============================================================================
// Regex Patterns
// ============================================================================

static COMPONENT_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\((\d+)\s+(ki\s+points?|sorcery\s+points?|superiority\s+di(?:ce|e)|charges?)\)")
        .expect("Failed to compile component cost regex")
});

static SPELL_LEVEL_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)equal\s+to\s+the\s+spell['’]?s\s+level")
        .expect("Failed to compile spell level cost regex")
});

static EXPEND_SUPERIORITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)expend\s+(one|a|an|two|three|\d+)\s+superiority\s+di(?:ce|e)")
        .expect("Failed to compile superiority die cost regex")
});

static SPEND_POINTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:spend|expend)\s+(one|two|three|four|five|six|\d+)\s+(ki|sorcery)\s+points?")
        .expect("Failed to compile point cost regex")
});

// ============================================================================
// Parsing
// ============================================================================

/// Cost printed in a components string, e.g. `V, S, M (3 sorcery points)`.
pub fn parse_component_cost(components: &str) -> Option<ResourceCost> {
    let caps = COMPONENT_COST.captures(components)?;
    let cost: u32 = caps[1].parse().ok()?;
    let resource = caps[2].to_lowercase();

    let resource_type = if resource.starts_with("ki") {
        ResourceType::KiPoints
    } else if resource.starts_with("sorcery") {
        ResourceType::SorceryPoints
    } else if resource.starts_with("superiority") {
        ResourceType::SuperiorityDie
    } else {
        ResourceType::Charges
    };
    Some(ResourceCost::fixed(resource_type, cost))
}

/// Cost described in prose.
pub fn parse_description_cost(description: &str) -> Option<ResourceCost> {
    if SPELL_LEVEL_COST.is_match(description) {
        return Some(ResourceCost {
            resource_type: ResourceType::SorceryPoints,
            cost: None,
            formula: Some(SPELL_LEVEL_FORMULA.to_string()),
        });
    }

    if let Some(caps) = EXPEND_SUPERIORITY.captures(description) {
        let cost = word_to_number(&caps[1]).unwrap_or(1);
        return Some(ResourceCost::fixed(ResourceType::SuperiorityDie, cost));
    }

    let caps = SPEND_POINTS.captures(description)?;
    let cost = word_to_number(&caps[1])?;
    let resource_type = if caps[2].eq_ignore_ascii_case("ki") {
        ResourceType::KiPoints
    } else {
        ResourceType::SorceryPoints
    };
    Some(ResourceCost::fixed(resource_type, cost))
}

/// Components first, then the description.
pub fn parse_resource_cost(components: Option<&str>, description: &str) -> Option<ResourceCost> {
    components
        .and_then(parse_component_cost)
        .or_else(|| parse_description_cost(description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("V, S, M (6 ki points)", ResourceType::KiPoints, 6)]
    #[case("V, S, M (1 ki point)", ResourceType::KiPoints, 1)]
    #[case("V, S, M (3 sorcery points)", ResourceType::SorceryPoints, 3)]
    #[case("M (1 superiority die)", ResourceType::SuperiorityDie, 1)]
    #[case("M (2 superiority dice)", ResourceType::SuperiorityDie, 2)]
    #[case("V, M (2 charges)", ResourceType::Charges, 2)]
    fn test_component_costs(#[case] components: &str, #[case] expected: ResourceType, #[case] cost: u32) {
        let parsed = parse_component_cost(components).unwrap();
        assert_eq!(parsed.resource_type, expected);
        assert_eq!(parsed.cost, Some(cost));
        assert_eq!(parsed.formula, None);
    }

    #[rstest]
    #[case("When you use a maneuver, you expend one superiority die.", ResourceType::SuperiorityDie, 1)]
    #[case("You can expend a superiority die to add it to the roll.", ResourceType::SuperiorityDie, 1)]
    #[case("Expend 2 superiority dice to push the target.", ResourceType::SuperiorityDie, 2)]
    #[case("You can spend 2 ki points to cast shatter.", ResourceType::KiPoints, 2)]
    #[case("You can spend 1 sorcery point to cast it without components.", ResourceType::SorceryPoints, 1)]
    fn test_description_costs(#[case] text: &str, #[case] expected: ResourceType, #[case] cost: u32) {
        let parsed = parse_description_cost(text).unwrap();
        assert_eq!(parsed.resource_type, expected);
        assert_eq!(parsed.cost, Some(cost));
    }

    #[test]
    fn test_twinned_spell_formula() {
        let parsed = parse_description_cost(
            "To do so, you must spend a number of sorcery points equal to the spell's level (1 if the spell is a cantrip).",
        )
        .unwrap();
        assert_eq!(parsed.resource_type, ResourceType::SorceryPoints);
        assert_eq!(parsed.cost, None);
        assert_eq!(parsed.formula.as_deref(), Some(SPELL_LEVEL_FORMULA));
    }

    #[test]
    fn test_components_win_over_description() {
        let parsed = parse_resource_cost(
            Some("V, S, M (4 ki points)"),
            "You can expend one superiority die.",
        )
        .unwrap();
        assert_eq!(parsed, ResourceCost::fixed(ResourceType::KiPoints, 4));
    }

    #[test]
    fn test_no_cost() {
        assert_eq!(parse_resource_cost(Some("V, S"), "You gain darkvision."), None);
        assert_eq!(parse_resource_cost(None, "You regain 1 hit point."), None);
    }
}
