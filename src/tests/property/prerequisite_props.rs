//! Property-based tests for feat prerequisite grouping
//!
//! Tests invariants:
//! - Non-empty text always yields at least one fact
//! - Group ids start at 1 and never decrease
//! - A fact is an alternative exactly when its group has 2+ members
//! - Separate lines never share an OR group
//! - Ability thresholds carry their minimum value
//! - Parsing is deterministic

use proptest::prelude::*;

use crate::ingestion::parsers::feat::{parse_prerequisites, PrerequisiteType};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

fn arb_ability() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "Strength",
        "Dexterity",
        "Constitution",
        "Intelligence",
        "Wisdom",
        "Charisma",
    ])
}

/// One comma separated prerequisite segment
fn arb_segment() -> impl Strategy<Value = String> {
    prop_oneof![
        (arb_ability(), 8u32..20).prop_map(|(a, v)| format!("{} {}", a, v)),
        (arb_ability(), arb_ability(), 8u32..20)
            .prop_map(|(a, b, v)| format!("{} or {} {} or higher", a, b, v)),
        (arb_ability(), arb_ability(), 8u32..20)
            .prop_map(|(a, b, v)| format!("{} and {} {}", a, b, v)),
        prop::sample::select(vec!["Dwarf", "Elf", "Gnome", "Halfling", "Half-Orc", "Elf (High)", "Small Race"])
            .prop_map(str::to_string),
        prop::sample::select(vec![
            "Proficiency in Acrobatics",
            "Proficiency with medium armor",
            "Proficiency with heavy armor",
        ])
        .prop_map(str::to_string),
        prop::sample::select(vec![
            "The ability to cast at least one spell",
            "Spellcasting or Pact Magic feature",
            "4th level",
        ])
        .prop_map(str::to_string),
    ]
}

/// A single-line prerequisite sentence
fn arb_line() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_segment(), 1..6).prop_map(|segments| segments.join(", "))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_never_panics(text in "[ -~\n]{0,200}") {
        let _ = parse_prerequisites(Some(&text));
    }

    #[test]
    fn prop_text_is_never_lost(text in "[ -~]{0,80}") {
        let facts = parse_prerequisites(Some(&text));
        prop_assert_eq!(facts.is_empty(), text.trim().is_empty());
    }

    #[test]
    fn prop_parse_is_deterministic(lines in prop::collection::vec(arb_line(), 1..4)) {
        let text = lines.join("\n");
        prop_assert_eq!(parse_prerequisites(Some(&text)), parse_prerequisites(Some(&text)));
    }

    #[test]
    fn prop_group_ids_start_at_one_and_never_decrease(line in arb_line()) {
        let facts = parse_prerequisites(Some(&line));
        prop_assert!(!facts.is_empty());
        prop_assert_eq!(facts[0].group_id, 1);
        for pair in facts.windows(2) {
            prop_assert!(pair[0].group_id <= pair[1].group_id);
        }
    }

    #[test]
    fn prop_alternative_iff_group_has_several_members(line in arb_line()) {
        let facts = parse_prerequisites(Some(&line));
        for fact in &facts {
            let members = facts.iter().filter(|f| f.group_id == fact.group_id).count();
            prop_assert_eq!(fact.is_alternative, members >= 2, "in {:?}", line);
        }
    }

    #[test]
    fn prop_ability_threshold_keeps_minimum(ability in arb_ability(), minimum in 8u32..20) {
        let text = format!("{} {} or higher", ability, minimum);
        let facts = parse_prerequisites(Some(&text));
        prop_assert_eq!(facts.len(), 1);
        prop_assert_eq!(facts[0].prerequisite_type, Some(PrerequisiteType::AbilityScore));
        prop_assert_eq!(facts[0].minimum_value, Some(minimum));
        prop_assert!(!facts[0].is_alternative);
    }

    #[test]
    fn prop_lines_are_each_required(first in arb_ability(), second in arb_ability(), minimum in 8u32..20) {
        let text = format!("{} {}\n{} {}", first, minimum, second, minimum);
        let facts = parse_prerequisites(Some(&text));
        prop_assert_eq!(facts.len(), 2);
        prop_assert!(facts.iter().all(|f| !f.is_alternative));
    }

    #[test]
    fn prop_lines_never_share_or_groups(lines in prop::collection::vec(arb_line(), 2..4)) {
        let per_line: Vec<usize> = lines
            .iter()
            .map(|line| parse_prerequisites(Some(line)).len())
            .collect();
        let facts = parse_prerequisites(Some(&lines.join("\n")));
        prop_assert_eq!(facts.len(), per_line.iter().sum::<usize>());

        if per_line.iter().all(|&n| n == 1) {
            prop_assert!(facts.iter().all(|f| f.group_id == 1 && !f.is_alternative));
            return Ok(());
        }

        for fact in &facts {
            let members = facts.iter().filter(|f| f.group_id == fact.group_id).count();
            prop_assert_eq!(fact.is_alternative, members >= 2);
        }

        let mut start = 0;
        let mut previous_max = 0;
        for count in per_line {
            let chunk = &facts[start..start + count];
            let min = chunk.iter().map(|f| f.group_id).min().unwrap_or(0);
            prop_assert!(min > previous_max);
            previous_max = chunk.iter().map(|f| f.group_id).max().unwrap_or(previous_max);
            start += count;
        }
    }
}
