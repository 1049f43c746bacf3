//! Charge Extraction
//!
//! Reads an item's charge pool from its description: a fixed or dice-based
//! maximum, how many charges it regains, and when.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::concerns::charges::parse_charges;
//!
//! let charges = parse_charges("This wand has 7 charges. It regains 1d6 + 1 expended charges daily at dawn.").unwrap();
//! assert_eq!(charges.recharge_formula.as_deref(), Some("1d6+1"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::dice::canonical_dice;
use super::rest_timing::{parse_reset_timing, ResetTiming};
use super::vocabulary::word_to_number;

// ============================================================================
// Types
// ============================================================================

/// Maximum charges: a count, or a dice formula rolled when the item is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChargesMax {
    Fixed(u32),
    Formula(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charges {
    pub charges_max: Option<ChargesMax>,
    /// "1d6+1", "3", or "all"
    pub recharge_formula: Option<String>,
    pub recharge_timing: Option<ResetTiming>,
}

impl Charges {
    fn is_empty(&self) -> bool {
        self.charges_max.is_none() && self.recharge_formula.is_none() && self.recharge_timing.is_none()
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

static MAX_CHARGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(?:has|have|starts\s+with|with|holds?|contains?)\s+
        (?P<amount>
            \d+d\d+(?:\s*[+\-−]\s*\d+)?
            |\d+
            |one|two|three|four|five|six|seven|eight|nine|ten|twelve|twenty
        )
        \s+charges?\b
        ",
    )
    .expect("Failed to compile max charges regex")
});

static RECHARGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \bregains?\s+
        (?P<amount>
            all
            |\d+d\d+(?:\s*[+\-−]\s*\d+)?
            |\d+
            |one|two|three|four|five|six
        )
        \s+(?:of\s+its\s+|of\s+the\s+)?(?:expended\s+|spent\s+)?charges?\b
        ",
    )
    .expect("Failed to compile recharge regex")
});

// ============================================================================
// Extraction
// ============================================================================

/// Parse the charge pool of an item description.
pub fn parse_charges(text: &str) -> Option<Charges> {
    let mut charges = Charges::default();

    if let Some(caps) = MAX_CHARGES.captures(text) {
        let amount = caps.name("amount").map(|m| m.as_str()).unwrap_or("");
        charges.charges_max = parse_amount(amount).map(|a| match a {
            Amount::Count(n) => ChargesMax::Fixed(n),
            Amount::Formula(f) => ChargesMax::Formula(f),
        });
    }

    if let Some(caps) = RECHARGE.captures(text) {
        let amount = caps.name("amount").map(|m| m.as_str()).unwrap_or("");
        charges.recharge_formula = if amount.eq_ignore_ascii_case("all") {
            Some("all".to_string())
        } else {
            parse_amount(amount).map(|a| match a {
                Amount::Count(n) => n.to_string(),
                Amount::Formula(f) => f,
            })
        };

        let sentence = sentence_around(text, caps.get(0).map(|m| m.start()).unwrap_or(0));
        charges.recharge_timing = parse_reset_timing(sentence);
    }

    if charges.recharge_timing.is_none() && charges.charges_max.is_some() {
        charges.recharge_timing = parse_reset_timing(text);
    }

    if charges.is_empty() {
        None
    } else {
        Some(charges)
    }
}

enum Amount {
    Count(u32),
    Formula(String),
}

fn parse_amount(raw: &str) -> Option<Amount> {
    if let Some(formula) = canonical_dice(raw) {
        return Some(Amount::Formula(formula));
    }
    word_to_number(raw).map(Amount::Count)
}

/// The sentence containing byte offset `at`.
fn sentence_around(text: &str, at: usize) -> &str {
    let start = text[..at].rfind(['.', '\n']).map(|i| i + 1).unwrap_or(0);
    let end = text[at..]
        .find(['.', '\n'])
        .map(|i| at + i)
        .unwrap_or(text.len());
    &text[start..end]
}

// ============================================================================
// Tests
// ============================================================================
