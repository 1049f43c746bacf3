//! Property-based tests for the shared pattern concerns
//!
//! Tests invariants:
//! - Never panics on arbitrary rules text
//! - Stripping citations is idempotent
//! - Canonical dice notation is a fixed point
//! - Resolved unarmored AC stays within its valid range
//! - Extraction is deterministic

use proptest::prelude::*;

use crate::ingestion::concerns::{
    canonical_dice, extract_languages_from_text, parse_charges, parse_item_proficiencies,
    parse_item_spells, parse_modifier_text, parse_movement_modifiers, parse_movement_speeds,
    parse_natural_weapon, parse_pack_contents, parse_random_tables, parse_reset_timing,
    parse_resistance_modifiers, parse_resource_cost, parse_set_score_modifiers,
    parse_skill_advantages,
};
use crate::ingestion::concerns::projectile_scaling::{
    parse_character_level_beam_scaling, parse_projectile_scaling,
};
use crate::ingestion::concerns::saving_throws::{
    parse_item_saving_throws, parse_spell_saving_throws,
};
use crate::ingestion::concerns::scaling_increment::parse_scaling_increment;
use crate::ingestion::concerns::source_citations::{book_code, parse_citations, strip_citations};
use crate::ingestion::concerns::subclass_spell_tables::parse_subclass_spell_table;
use crate::ingestion::concerns::unarmored_ac::parse_unarmored_ac;
use crate::ingestion::concerns::usage_limits::parse_usage_limit;

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Printable ASCII with line breaks
fn arb_text() -> impl Strategy<Value = String> {
    "[ -~\n]{0,400}"
}

/// Fragments the concerns actually look for, so that generated text reaches
/// past the first regex guard.
fn arb_rules_phrase() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Source: Player's Handbook (2014) p. 211".to_string()),
        Just("This wand has 7 charges. It regains 1d6 + 1 expended charges daily at dawn.".to_string()),
        Just("you can cast the fireball spell (save DC 15) from it".to_string()),
        Just("must succeed on a DC 13 Constitution saving throw or take 2d6 poison damage, or half as much damage on a successful one.".to_string()),
        Just("your AC equals 13 + your Dexterity modifier".to_string()),
        Just("You have advantage on Wisdom (Perception) checks.".to_string()),
        Just("You have resistance to fire damage.".to_string()),
        Just("Your Strength score is 19 while you wear this belt.".to_string()),
        Just("You have a climbing speed equal to your walking speed.".to_string()),
        Just("Difficult terrain costs you no extra movement.".to_string()),
        Just("Includes:\n• a backpack\n• 10 torches\n• 10 days of rations".to_string()),
        Just("d8 | Personality Trait\n1 | I idolize a hero.\n2 | I am tolerant.".to_string()),
        Just("Cleric Level | Spells\n1st | bless, cure wounds\n3rd | lesser restoration, spiritual weapon".to_string()),
        Just("You can use this feature a number of times equal to your proficiency bonus, and you regain all expended uses when you finish a long rest.".to_string()),
        Just("You learn one language of your choice and can speak Elvish.".to_string()),
        Just("The damage increases by 1d6 for each slot level above 1st.".to_string()),
        Just("You create three glowing darts of magical force.".to_string()),
        Just("The spell creates more than one beam when you reach higher levels: two beams at 5th level".to_string()),
        Just("You are proficient with the longsword and with martial weapons.".to_string()),
        Just("V, S, M (2 ki points)".to_string()),
        Just("you must spend a number of sorcery points equal to the spell's level".to_string()),
        Just("you can expend one superiority die to add it to the roll".to_string()),
        Just("Claws. Your claws are natural weapons, which you can use to make unarmed strikes. If you hit with them, you deal slashing damage equal to 1d4 + your Strength modifier".to_string()),
    ]
}

/// Rules phrases surrounded by noise
fn arb_mixed_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![arb_rules_phrase(), "[ -~\n]{0,40}"], 0..6)
        .prop_map(|parts| parts.join(" "))
}

/// Well-formed dice notation with optional spacing around the modifier
fn arb_dice() -> impl Strategy<Value = String> {
    (
        prop::option::of(1u32..20),
        prop::sample::select(vec!["4", "6", "8", "10", "12", "20", "100", "%"]),
        prop::option::of((prop::sample::select(vec!["+", "-"]), 0u32..20)),
        prop::bool::ANY,
    )
        .prop_map(|(count, sides, modifier, spaced)| {
            let mut dice = format!("{}d{}", count.map(|c| c.to_string()).unwrap_or_default(), sides);
            if let Some((sign, value)) = modifier {
                let gap = if spaced { " " } else { "" };
                dice.push_str(&format!("{gap}{sign}{gap}{value}"));
            }
            dice
        })
}

fn exercise_all(text: &str) {
    let _ = parse_charges(text);
    let _ = canonical_dice(text);
    let _ = parse_item_proficiencies(text);
    let _ = parse_item_spells(text);
    let _ = extract_languages_from_text(text);
    let _ = parse_modifier_text(text, "bonus");
    let _ = parse_set_score_modifiers(text);
    let _ = parse_resistance_modifiers(text);
    let _ = parse_skill_advantages(text);
    let _ = parse_movement_modifiers(text);
    let _ = parse_movement_speeds(text, 30);
    let _ = parse_natural_weapon("Claws", text);
    let _ = parse_pack_contents(text);
    let _ = parse_projectile_scaling(Some(text), text);
    let _ = parse_character_level_beam_scaling(text);
    let _ = parse_random_tables(text);
    let _ = parse_reset_timing(text);
    let _ = parse_item_saving_throws(text);
    let _ = parse_spell_saving_throws(text);
    let _ = parse_scaling_increment(Some(text));
    let _ = parse_citations(text);
    let _ = book_code(text);
    let _ = parse_subclass_spell_table(text);
    let _ = parse_unarmored_ac(text);
    let _ = parse_usage_limit(text);
    let _ = parse_resource_cost(Some(text), text);
}

/// Debug rendering of every extractor's output for one text.
fn extract_all(text: &str) -> String {
    format!(
        "{:?}",
        (
            parse_charges(text),
            canonical_dice(text),
            parse_item_spells(text),
            parse_modifier_text(text, "bonus"),
            parse_movement_modifiers(text),
            parse_natural_weapon("Claws", text),
            parse_random_tables(text),
            parse_reset_timing(text),
            parse_spell_saving_throws(text),
            parse_citations(text),
            parse_subclass_spell_table(text),
            (parse_usage_limit(text), parse_resource_cost(Some(text), text)),
        )
    )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_concerns_never_panic(text in arb_text()) {
        exercise_all(&text);
    }

    #[test]
    fn prop_concerns_never_panic_on_rules_text(text in arb_mixed_text()) {
        exercise_all(&text);
    }

    #[test]
    fn prop_extraction_is_deterministic(text in arb_mixed_text()) {
        prop_assert_eq!(extract_all(&text), extract_all(&text));
    }

    #[test]
    fn prop_strip_citations_idempotent(text in arb_mixed_text()) {
        let once = strip_citations(&text);
        let twice = strip_citations(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_stripped_text_has_no_citations(text in arb_mixed_text()) {
        let stripped = strip_citations(&text);
        prop_assert!(parse_citations(&stripped).is_empty());
    }

    #[test]
    fn prop_canonical_dice_is_fixed_point(dice in arb_dice()) {
        let canonical = canonical_dice(&dice);
        prop_assert!(canonical.is_some(), "{} should be dice notation", dice);
        let canonical = canonical.unwrap_or_default();
        prop_assert_eq!(canonical_dice(&canonical), Some(canonical.clone()));
        prop_assert!(!canonical.contains(' '));
    }

    #[test]
    fn prop_unarmored_ac_in_range(base in 0u32..40, ability in prop::sample::select(vec!["Dexterity", "Constitution", "Wisdom"])) {
        let text = format!("While you aren't wearing armor, your AC equals {} + your {} modifier.", base, ability);
        match parse_unarmored_ac(&text) {
            Some(ac) => {
                prop_assert!((10..=20).contains(&ac.base_ac));
                prop_assert_eq!(ac.base_ac, base);
            }
            None => prop_assert!(!(10..=20).contains(&base)),
        }
    }
}
