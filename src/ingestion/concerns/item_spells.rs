//! Item-Granted Spells
//!
//! Finds the spells a charged item can cast and what each costs. Costs appear
//! either as a parenthetical after the spell name ("fireball (3 charges)",
//! "cure wounds (1 charge per spell level, up to 4th)", "light (no charges)")
//! or as a sentence ("expend 1 charge and cast wish").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::word_to_number;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpell {
    pub spell_name: String,
    pub charges_cost_min: Option<u32>,
    pub charges_cost_max: Option<u32>,
    pub charges_cost_formula: Option<String>,
}

// ============================================================================
// Regex Patterns
// ============================================================================

/// "<spell name> (<cost mentioning charges>)"
static PARENTHETICAL_SPELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?P<name>[a-z][a-z'’\- ]*?)\s*\((?P<cost>[^)]*\bcharges?\b[^)]*)\)")
        .expect("Failed to compile parenthetical spell regex")
});

/// "expend 1 charge and cast wish", "expend 3 charges to cast the fly spell"
static EXPEND_AND_CAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \bexpend\s+(?P<amount>\d+|one|two|three|four|five|six|seven|eight|nine|ten)
        \s+(?:of\s+its\s+)?charges?\s+(?:and|to)\s+cast\s+(?:the\s+)?
        (?P<name>[a-z][a-z'’\-]*(?:\s+[a-z][a-z'’\-]*)*?)
        (?:\s+spell)?
        (?:\s+(?:from|on|at|as|with|using)\b|\s*[(.,;:]|\s*$)
        ",
    )
    .expect("Failed to compile expend-and-cast regex")
});

static PER_LEVEL_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<n>\d+|one|two|three)\s+charges?\s+per\s+spell\s+level(?:\s*,\s*up\s+to\s+(?P<max>\d+)(?:st|nd|rd|th)?)?",
    )
    .expect("Failed to compile per-level cost regex")
});

static FIXED_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?P<n>\d+|one|two|three|four|five|six|seven|eight|nine|ten)\s+charges?\b")
        .expect("Failed to compile fixed cost regex")
});

static NO_COST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bno\s+charges?\b").expect("Failed to compile no-cost regex")
});

/// Leading connector words that the name pattern can swallow.
static LEADING_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:or|and|cast|then|spells?|following|the\s+following\s+spells?|following\s+spells?)\s+)+",
    )
    .expect("Failed to compile leading noise regex")
});

// ============================================================================
// Extraction
// ============================================================================

/// Extract every spell an item grants, in the order they are mentioned.
pub fn parse_item_spells(text: &str) -> Vec<ItemSpell> {
    let mut found: Vec<(usize, ItemSpell)> = Vec::new();

    for caps in PARENTHETICAL_SPELL.captures_iter(text) {
        let (Some(name_match), Some(cost)) = (caps.name("name"), caps.name("cost")) else {
            continue;
        };
        let Some(name) = clean_spell_name(name_match.as_str()) else {
            continue;
        };
        let Some((min, max, formula)) = parse_cost(cost.as_str()) else {
            continue;
        };
        found.push((
            name_match.start(),
            ItemSpell {
                spell_name: name,
                charges_cost_min: Some(min),
                charges_cost_max: max,
                charges_cost_formula: formula,
            },
        ));
    }

    for caps in EXPEND_AND_CAST.captures_iter(text) {
        let (Some(name_match), Some(amount)) = (caps.name("name"), caps.name("amount")) else {
            continue;
        };
        let Some(name) = clean_spell_name(name_match.as_str()) else {
            continue;
        };
        let Some(cost) = word_to_number(amount.as_str()) else {
            continue;
        };
        found.push((
            name_match.start(),
            ItemSpell {
                spell_name: name,
                charges_cost_min: Some(cost),
                charges_cost_max: Some(cost),
                charges_cost_formula: None,
            },
        ));
    }

    found.sort_by_key(|(pos, _)| *pos);

    let mut spells: Vec<ItemSpell> = Vec::new();
    for (_, spell) in found {
        if !spells
            .iter()
            .any(|s| s.spell_name.eq_ignore_ascii_case(&spell.spell_name))
        {
            spells.push(spell);
        }
    }
    spells
}

fn parse_cost(cost: &str) -> Option<(u32, Option<u32>, Option<String>)> {
    if NO_COST.is_match(cost) {
        return Some((0, Some(0), None));
    }
    if let Some(caps) = PER_LEVEL_COST.captures(cost) {
        let per_level = word_to_number(caps.name("n")?.as_str())?;
        let max = caps.name("max").and_then(|m| m.as_str().parse().ok());
        return Some((
            per_level,
            max,
            Some(format!("{} per spell level", per_level)),
        ));
    }
    if let Some(caps) = FIXED_COST.captures(cost) {
        let n = word_to_number(caps.name("n")?.as_str())?;
        return Some((n, Some(n), None));
    }
    None
}

fn clean_spell_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    let after_cast = match lower.rfind("cast ") {
        Some(i) if i == 0 || lower[..i].ends_with(' ') => trimmed.get(i + 5..).unwrap_or(trimmed),
        _ => trimmed,
    };
    let name = LEADING_NOISE.replace(after_cast.trim(), "");
    let name = name.trim().trim_end_matches(" spell").trim();

    if name.is_empty() || name.len() > 40 {
        return None;
    }
    let lower = name.to_lowercase();
    if lower.starts_with("one of") || lower == "it" || lower == "charges" {
        return None;
    }
    Some(name.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(spells: &[ItemSpell]) -> Vec<&str> {
        spells.iter().map(|s| s.spell_name.as_str()).collect()
    }

    #[test]
    fn test_or_separated_list() {
        let spells = parse_item_spells(
            "While holding it, you can expend charges to cast burning hands (1 charge) or fireball (3 charges).",
        );
        assert_eq!(names(&spells), vec!["burning hands", "fireball"]);
        assert_eq!(spells[1].charges_cost_min, Some(3));
        assert_eq!(spells[1].charges_cost_max, Some(3));
    }

    #[test]
    fn test_following_spells_list() {
        let spells = parse_item_spells(
            "You can use an action to expend 1 or more of its charges to cast one of the following spells: hold person (2 charges) or hold monster (5 charges).",
        );
        assert_eq!(names(&spells), vec!["hold person", "hold monster"]);
    }

    #[test]
    fn test_possessive_name() {
        let spells = parse_item_spells("cast mordenkainen's sword (7 charges)");
        assert_eq!(names(&spells), vec!["mordenkainen's sword"]);
        assert_eq!(spells[0].charges_cost_min, Some(7));
    }

    #[test]
    fn test_per_spell_level_cost() {
        let spells = parse_item_spells(
            "cure wounds (1 charge per spell level, up to 4th), or lesser restoration (2 charges), or mass cure wounds (5 charges)",
        );
        assert_eq!(
            names(&spells),
            vec!["cure wounds", "lesser restoration", "mass cure wounds"]
        );
        assert_eq!(spells[0].charges_cost_min, Some(1));
        assert_eq!(spells[0].charges_cost_max, Some(4));
        assert_eq!(
            spells[0].charges_cost_formula.as_deref(),
            Some("1 per spell level")
        );
    }

    #[test]
    fn test_no_charges_cost() {
        let spells = parse_item_spells("cast light (no charges) or detect magic (1 charge)");
        assert_eq!(spells[0].spell_name, "light");
        assert_eq!(spells[0].charges_cost_min, Some(0));
        assert_eq!(spells[0].charges_cost_max, Some(0));
    }

    #[test]
    fn test_expend_and_cast() {
        let spells = parse_item_spells(
            "The sword has 1d4 - 1 charges. While holding it, you can use an action to expend 1 charge and cast wish from it.",
        );
        assert_eq!(spells.len(), 1);
        assert_eq!(spells[0].spell_name, "wish");
        assert_eq!(spells[0].charges_cost_min, Some(1));
        assert_eq!(spells[0].charges_cost_max, Some(1));
    }

    #[test]
    fn test_no_spells() {
        assert!(parse_item_spells("This wand has 7 charges.").is_empty());
    }
}
