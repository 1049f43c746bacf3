//! Upcast Scaling Increment
//!
//! Reads a spell's "At Higher Levels" text and returns the amount its damage or
//! healing grows per slot level ("1d6", "5"). Scaling that adds targets,
//! extends duration or widens an area yields nothing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::dice::canonical_dice;

static INCREASES_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bincreases?\s+by\s+(\d+d\d+(?:\s*[+\-]\s*\d+)?|\d+)\b")
        .expect("Failed to compile increases-by regex")
});

static ADDITIONAL_DAMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:an?\s+)?(?:additional|extra)\s+(\d+d\d+|\d+)\s+(?:\w+\s+)?(?:damage|hit\s+points)",
    )
    .expect("Failed to compile additional damage regex")
});

const SCALING_TARGETS: &[&str] = &["damage", "healing", "hit points", "hit point"];
const NON_DAMAGE_TARGETS: &[&str] = &[
    "duration",
    "radius",
    "range",
    "number of",
    "target",
    "creatures",
    "size",
];

/// Return the per-level damage or healing increment, or `None`.
pub fn parse_scaling_increment(higher_levels: Option<&str>) -> Option<String> {
    let text = higher_levels?.trim();
    if text.is_empty() {
        return None;
    }

    for caps in INCREASES_BY.captures_iter(text) {
        let (Some(whole), Some(amount)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let clause = clause_before(text, whole.start()).to_lowercase();
        let names_target = SCALING_TARGETS.iter().any(|t| clause.contains(t));
        let names_other = NON_DAMAGE_TARGETS.iter().any(|t| clause.contains(t));
        if names_target && !names_other {
            return Some(normalize_amount(amount.as_str()));
        }
    }

    ADDITIONAL_DAMAGE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_amount(m.as_str()))
}

fn normalize_amount(raw: &str) -> String {
    canonical_dice(raw).unwrap_or_else(|| raw.trim().to_string())
}

/// Text between the previous clause boundary and `at`.
fn clause_before(text: &str, at: usize) -> &str {
    let head = &text[..at];
    let start = head.rfind(['.', ',', ';']).map(|i| i + 1).unwrap_or(0);
    &head[start..]
}
