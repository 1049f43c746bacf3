//! Dice Notation
//!
//! Renders dice formulas ("2d6 + 3", "1d4 - 1", "d8") in the compact
//! canonical form the records store.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::concerns::dice::canonical_dice;
//!
//! assert_eq!(canonical_dice("1d4 - 1").as_deref(), Some("1d4-1"));
//! assert_eq!(canonical_dice("1d6 fire"), None);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// Types
// ============================================================================

/// A parsed dice expression (e.g., "2d6+3").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DiceExpression {
    count: u32,
    sides: u32,
    modifier: i64,
}

impl DiceExpression {
    /// Canonical notation with an explicit count and no spaces ("1d4-1", "2d6+3", "1d8").
    fn to_canonical(self) -> String {
        let base = format!("{}d{}", self.count, self.sides);

        if self.modifier == 0 {
            base
        } else if self.modifier > 0 {
            format!("{}+{}", base, self.modifier)
        } else {
            format!("{}{}", base, self.modifier)
        }
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

/// "d20", "2d6", "3d8+5", "1d4 - 1"
static DICE_EXPR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^
        (?P<count>\d+)?                 # Optional count (defaults to 1)
        d                               # The 'd' separator
        (?P<sides>\d+|%)                # Die sides or % for d100
        (?:
            \s*                         # Optional whitespace
            (?P<mod_sign>[+\-−–])       # Modifier sign (various dash types)
            \s*                         # Optional whitespace
            (?P<modifier>\d+)           # Modifier value
        )?
        $
        ",
    )
    .expect("Failed to compile dice expression regex")
});

/// Canonicalize a dice formula string ("1d4 - 1" -> "1d4-1"). Returns `None`
/// when the whole string is not dice notation.
pub fn canonical_dice(text: &str) -> Option<String> {
    let caps = DICE_EXPR_PATTERN.captures(text.trim())?;

    let count: u32 = match caps.name("count") {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };

    let sides: u32 = match caps.name("sides").map(|m| m.as_str()) {
        Some("%") => 100,
        Some(sides) => sides.parse().ok()?,
        None => return None,
    };

    let modifier: i64 = match (caps.name("mod_sign"), caps.name("modifier")) {
        (Some(sign), Some(value)) => {
            let value: i64 = value.as_str().parse().ok()?;
            if sign.as_str() == "+" {
                value
            } else {
                -value
            }
        }
        _ => 0,
    };

    Some(
        DiceExpression {
            count,
            sides,
            modifier,
        }
        .to_canonical(),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_removes_spaces() {
        assert_eq!(canonical_dice("1d4 - 1").as_deref(), Some("1d4-1"));
        assert_eq!(canonical_dice(" 2d6 + 3 ").as_deref(), Some("2d6+3"));
        assert_eq!(canonical_dice("1d4 – 1").as_deref(), Some("1d4-1"));
    }

    #[test]
    fn test_implicit_count_and_percentile() {
        assert_eq!(canonical_dice("d20").as_deref(), Some("1d20"));
        assert_eq!(canonical_dice("d%").as_deref(), Some("1d100"));
    }

    #[test]
    fn test_canonical_dice_requires_whole_string() {
        assert_eq!(canonical_dice("1d6 + 1"), Some("1d6+1".to_string()));
        assert_eq!(canonical_dice("1d6 fire"), None);
        assert_eq!(canonical_dice("roll 1d6"), None);
        assert_eq!(canonical_dice("all"), None);
    }

    #[test]
    fn test_oversized_numbers_are_not_dice() {
        assert_eq!(canonical_dice("99999999999d6"), None);
        assert_eq!(canonical_dice("1d6+99999999999999999999"), None);
    }
}
