//! Random Table Parsing Module
//!
//! Parses pipe-delimited roll tables embedded in descriptions:
//!
//! ```text
//! d8 | Power
//! 1 | Red: The target takes 10d6 fire damage...
//! 2-6 | The creature doesn't move.
//! ```
//!
//! A header line `dN | Title` opens a table; rows of `N | text` or `N-M | text`
//! follow until the first line that is not a row.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// A parsed roll table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomTable {
    /// Header text after the die ("Power", "Personality Trait")
    pub table_name: String,
    /// Die notation as written in the header (d6, d8, d100, 2d6)
    pub dice_type: String,
    pub entries: Vec<TableEntry>,
}

impl RandomTable {
    /// Number of distinct results the table's die can produce.
    pub fn total_outcomes(&self) -> u32 {
        let Some(caps) = HEADER_DIE.captures(&self.dice_type) else {
            return 0;
        };
        let count = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1);
        let sides = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0);

        if count <= 1 {
            sides
        } else {
            // 2d6 spans 2..=12
            count * sides - count + 1
        }
    }

    /// Probability of landing on `entry` with a single roll.
    pub fn probability(&self, entry: &TableEntry) -> f32 {
        let total = self.total_outcomes();
        if total == 0 {
            return 0.0;
        }
        entry.range_size() as f32 / total as f32
    }
}

/// A single row of a roll table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub roll_min: u32,
    pub roll_max: u32,
    pub result_text: String,
}

impl TableEntry {
    pub fn new(roll_min: u32, roll_max: u32, result_text: impl Into<String>) -> Self {
        Self {
            roll_min,
            roll_max,
            result_text: result_text.into(),
        }
    }

    /// Check if a roll falls within this entry's range.
    pub fn matches_roll(&self, roll: u32) -> bool {
        roll >= self.roll_min && roll <= self.roll_max
    }

    fn range_size(&self) -> u32 {
        self.roll_max.saturating_sub(self.roll_min) + 1
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d*d\d+)\s*\|\s*(.+?)\s*$").expect("Failed to compile table header regex")
});

static HEADER_DIE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d*)d(\d+)$").expect("Failed to compile die regex"));

static RANGE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*[–\-−]\s*(\d+)\s*\|\s*(.+?)\s*$")
        .expect("Failed to compile range row regex")
});

static SINGLE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*\|\s*(.+?)\s*$").expect("Failed to compile single row regex")
});

// ============================================================================
// Parser
// ============================================================================

/// Parses every roll table found in a block of text.
#[derive(Debug, Clone, Default)]
pub struct RandomTableParser;

impl RandomTableParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse all tables in document order. Tables without rows are dropped.
    pub fn parse_all(&self, text: &str) -> Vec<RandomTable> {
        let mut tables = Vec::new();
        let mut current: Option<RandomTable> = None;

        for line in text.lines() {
            if let Some(caps) = HEADER.captures(line) {
                if let Some(table) = current.take() {
                    tables.push(table);
                }
                current = Some(RandomTable {
                    table_name: caps[2].to_string(),
                    dice_type: caps[1].to_lowercase(),
                    entries: Vec::new(),
                });
                continue;
            }

            let Some(table) = current.as_mut() else {
                continue;
            };

            match self.parse_row(line) {
                Some(entry) => table.entries.push(entry),
                None => {
                    if let Some(table) = current.take() {
                        tables.push(table);
                    }
                }
            }
        }

        if let Some(table) = current {
            tables.push(table);
        }

        tables.retain(|t| !t.entries.is_empty());
        tables
    }

    /// Parse a single `N | text` or `N-M | text` row.
    pub fn parse_row(&self, line: &str) -> Option<TableEntry> {
        if let Some(caps) = RANGE_ROW.captures(line) {
            let min = caps[1].parse().ok()?;
            let max = caps[2].parse().ok()?;
            return Some(TableEntry::new(min, max, &caps[3]));
        }

        let caps = SINGLE_ROW.captures(line)?;
        let roll = caps[1].parse().ok()?;
        Some(TableEntry::new(roll, roll, &caps[2]))
    }

    /// Check if text contains at least one roll table.
    pub fn has_table(&self, text: &str) -> bool {
        !self.parse_all(text).is_empty()
    }
}

/// Convenience wrapper over [`RandomTableParser::parse_all`].
pub fn parse_random_tables(text: &str) -> Vec<RandomTable> {
    RandomTableParser::new().parse_all(text)
}

// ============================================================================
// Tests
// ============================================================================
