//! Property-based tests for class slot tables and subclass matching
//!
//! Tests invariants:
//! - One base row per distinct non-optional level
//! - Optional-only casters have no base progression or ability
//! - A trailing parenthetical always matches its subclass
//! - A longer subclass name never matches a shorter one
//! - Base and subclass progressions together cover every slot level
//! - Parsing the same class twice gives the same record

use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::ingestion::parsers::class::{feature_belongs_to_subclass, parse_spell_slots};
use crate::ingestion::parsers::{ClassParser, EntityParser};
use crate::ingestion::xml::parse_document;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// (level, optional) pairs for `<slots>` elements
fn arb_slot_levels() -> impl Strategy<Value = Vec<(u32, bool)>> {
    prop::collection::vec((1u32..=20, prop::bool::ANY), 0..12)
}

fn arb_title_word() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,9}"
}

fn class_xml(levels: &[(u32, bool)]) -> String {
    let autolevels: String = levels
        .iter()
        .map(|(level, optional)| {
            let flag = if *optional { r#" optional="YES""# } else { "" };
            format!(r#"<autolevel level="{level}"><slots{flag}>2,3,1</slots></autolevel>"#)
        })
        .collect();
    format!(
        "<compendium><class><name>Caster</name><hd>8</hd><spellAbility>Intelligence</spellAbility>{}</class></compendium>",
        autolevels
    )
}

/// A third-caster: optional slots belong to the subclass that has a
/// "Spellcasting (X)" feature.
fn subclass_caster_xml(levels: &[(u32, bool)], subclass: &str) -> String {
    let slot_levels: String = levels
        .iter()
        .map(|(level, optional)| {
            let flag = if *optional { r#" optional="YES""# } else { "" };
            format!(r#"<autolevel level="{level}"><slots{flag}>2,2</slots></autolevel>"#)
        })
        .collect();
    format!(
        r#"<compendium><class><name>Fighter</name><hd>10</hd><spellAbility>Intelligence</spellAbility>
            <autolevel level="3">
              <feature optional="YES"><name>Martial Archetype: {subclass}</name><text>Intro.</text></feature>
              <feature optional="YES"><name>Spellcasting ({subclass})</name><text>You learn to cast spells.</text></feature>
            </autolevel>{slot_levels}</class></compendium>"#
    )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_one_base_row_per_non_optional_level(levels in arb_slot_levels()) {
        let root = parse_document(&class_xml(&levels)).unwrap();
        let class = root.child("class").unwrap();
        let rows = parse_spell_slots(class);

        let expected: BTreeSet<u32> = levels
            .iter()
            .filter(|(_, optional)| !optional)
            .map(|(level, _)| *level)
            .collect();
        let actual: Vec<u32> = rows.iter().map(|r| r.level).collect();
        prop_assert_eq!(actual, expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn prop_optional_only_caster_has_no_base_casting(levels in arb_slot_levels()) {
        let classes = ClassParser::new().parse(&class_xml(&levels)).unwrap();
        prop_assert_eq!(classes.len(), 1);
        let class = &classes[0];

        if levels.iter().all(|(_, optional)| *optional) {
            prop_assert!(class.spell_progression.is_none());
            prop_assert!(class.spellcasting_ability.is_none());
        } else {
            prop_assert!(class.spell_progression.is_some());
            prop_assert_eq!(class.spellcasting_ability.as_deref(), Some("Intelligence"));
        }
    }

    #[test]
    fn prop_trailing_parenthetical_matches(feature in arb_title_word(), subclass in arb_title_word()) {
        let name = format!("{} ({})", feature, subclass);
        prop_assert!(feature_belongs_to_subclass(&name, &subclass));
        prop_assert!(feature_belongs_to_subclass(&name, &subclass.to_uppercase()));
    }

    #[test]
    fn prop_longer_subclass_does_not_match_shorter(
        feature in arb_title_word(),
        qualifier in arb_title_word(),
        subclass in arb_title_word(),
    ) {
        let name = format!("{} ({} {})", feature, qualifier, subclass);
        prop_assert!(!feature_belongs_to_subclass(&name, &subclass));
    }

    #[test]
    fn prop_progressions_cover_every_slot_level(
        levels in arb_slot_levels(),
        subclass in arb_title_word(),
    ) {
        let classes = ClassParser::new().parse(&subclass_caster_xml(&levels, &subclass)).unwrap();
        let class = &classes[0];

        let all: BTreeSet<u32> = levels.iter().map(|(level, _)| *level).collect();
        let base: BTreeSet<u32> = class
            .spell_progression
            .iter()
            .flatten()
            .map(|row| row.level)
            .collect();
        let owner = class.subclasses.iter().find(|s| s.name == subclass);
        prop_assert!(owner.is_some(), "subclass {} was not detected", subclass);
        let sub: BTreeSet<u32> = owner
            .and_then(|s| s.spell_progression.as_ref())
            .into_iter()
            .flatten()
            .map(|row| row.level)
            .collect();

        prop_assert_eq!(base.union(&sub).copied().collect::<BTreeSet<_>>(), all);
        prop_assert_eq!(sub.is_empty(), levels.iter().all(|(_, optional)| !optional));
        for other in class.subclasses.iter().filter(|s| s.name != subclass) {
            prop_assert!(other.spell_progression.is_none());
        }
    }

    #[test]
    fn prop_class_parse_is_deterministic(levels in arb_slot_levels(), subclass in arb_title_word()) {
        let xml = subclass_caster_xml(&levels, &subclass);
        let parser = ClassParser::new();
        prop_assert_eq!(parser.parse(&xml).unwrap(), parser.parse(&xml).unwrap());
    }
}
