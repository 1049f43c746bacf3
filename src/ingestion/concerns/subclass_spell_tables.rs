//! Subclass Spell Tables
//!
//! Domain, circle, oath and expanded spell lists are printed as pipe tables:
//!
//! ```text
//! Cleric Level | Spells
//! 1st | bless, cure wounds
//! 3rd | lesser restoration, spiritual weapon
//! ```
//!
//! The level column is either a class level ("Druid Level") or a spell level
//! ("Spell Level"); both are returned as plain integers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubclassSpellLevel {
    pub level: u32,
    pub spells: Vec<String>,
}

static TABLE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*[A-Za-z]+\s+Level\s*\|\s*(?:[A-Za-z]+\s+)?Spells?\s*$")
        .expect("Failed to compile spell table header regex")
});

static LEVEL_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+)(?:st|nd|rd|th)?\s*\|\s*(.+?)\s*$")
        .expect("Failed to compile spell table row regex")
});

/// Parse the first subclass spell table in `text`. `None` when the text has no
/// table or the table has no rows.
pub fn parse_subclass_spell_table(text: &str) -> Option<Vec<SubclassSpellLevel>> {
    let header = TABLE_HEADER.find(text)?;

    let mut levels = Vec::new();
    for line in text[header.end()..].lines().skip_while(|l| l.trim().is_empty()) {
        let trimmed = line.trim();
        if trimmed.starts_with("Source:") {
            break;
        }
        let Some(caps) = LEVEL_ROW.captures(trimmed) else {
            break;
        };
        let Ok(level) = caps[1].parse::<u32>() else {
            break;
        };
        let spells: Vec<String> = caps[2]
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        levels.push(SubclassSpellLevel { level, spells });
    }

    if levels.is_empty() {
        None
    } else {
        Some(levels)
    }
}
