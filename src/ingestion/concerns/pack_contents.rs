//! Equipment Pack Contents
//!
//! Equipment packs list their contents as bullets after "Includes:". Each
//! bullet becomes a normalized item name plus a quantity, using the item
//! naming the equipment tables use ("rations (1 day)", "oil (flask)").
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::concerns::pack_contents::parse_pack_contents;
//!
//! let items = parse_pack_contents("Includes:\n• a backpack\n• 10 torches");
//! assert_eq!(items[1].name, "torch");
//! assert_eq!(items[1].quantity, 10);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackContentsItem {
    pub name: String,
    pub quantity: u32,
}

impl PackContentsItem {
    fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

static INCLUDES_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Includes:(.*?)(?:Source:|$)").expect("Failed to compile includes regex")
});

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)•\s*(.+?)\s*$").expect("Failed to compile bullet regex"));

/// Phrasings that map to a fixed table name. `$1` in the name is the captured number.
static SPECIAL_CASES: Lazy<Vec<(Regex, &'static str, bool)>> = Lazy::new(|| {
    let table: &[(&str, &'static str, bool)] = &[
        // (pattern, item name, quantity comes from capture 1)
        (r"(?i)^an?\s+bag\s+of\s+[\d,]+\s+ball\s+bearings", "ball bearings (bag of 1,000)", false),
        (r"(?i)^(\d+)\s+feet\s+of\s+string", "string ($1 feet)", false),
        (r"(?i)^(\d+)\s+feet(?:\s+of)?\s+hempen\s+rope", "hempen rope ($1 feet)", false),
        (r"(?i)^(\d+)\s+days?\s+(?:of\s+)?rations", "rations (1 day)", true),
        (r"(?i)^(\d+)\s+flasks?\s+of\s+oil", "oil (flask)", true),
        (r"(?i)^(\d+)\s+sheets?\s+of\s+paper", "paper (one sheet)", true),
        (r"(?i)^(\d+)\s+sheets?\s+of\s+parchment", "parchment (one sheet)", true),
        (r"(?i)^an?\s+bottle\s+of\s+ink", "ink (1-ounce bottle)", false),
        (r"(?i)^(\d+)\s+cases?\s+for\s+maps\s+and\s+scrolls", "map or scroll case", true),
        (r"(?i)^an?\s+vial\s+of\s+perfume", "perfume (vial)", false),
        (r"(?i)^(\d+)\s+costumes?", "costume clothes", true),
        (r"(?i)^an?\s+book\s+of\s+lore", "book", false),
        (r"(?i)^an?\s+set\s+of\s+fine\s+clothes", "fine clothes", false),
        (r"(?i)^(\d+)\s+blocks?\s+of\s+incense", "incense", true),
    ];
    table
        .iter()
        .map(|(pattern, name, counted)| {
            (
                Regex::new(pattern).expect("Failed to compile pack contents regex"),
                *name,
                *counted,
            )
        })
        .collect()
});

static COUNTED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s+(.+)$").expect("Failed to compile counted item regex"));

static ARTICLE_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^an?\s+(.+)$").expect("Failed to compile article item regex"));

const PLURAL_EXCEPTIONS: &[&str] = &["clothes", "mess", "rations", "ball bearings"];

// ============================================================================
// Extraction
// ============================================================================

/// Parse the "Includes:" bullet list of a pack description.
pub fn parse_pack_contents(description: &str) -> Vec<PackContentsItem> {
    if !description.contains("Includes:") {
        return Vec::new();
    }

    let Some(section) = INCLUDES_SECTION
        .captures(description)
        .and_then(|caps| caps.get(1))
    else {
        return Vec::new();
    };

    BULLET
        .captures_iter(section.as_str())
        .filter_map(|caps| caps.get(1))
        .filter_map(|line| parse_content_line(line.as_str().trim()))
        .collect()
}

fn parse_content_line(line: &str) -> Option<PackContentsItem> {
    let line = line.trim_end_matches('.').trim();
    if line.is_empty() {
        return None;
    }

    for (pattern, name, counted) in SPECIAL_CASES.iter() {
        if let Some(caps) = pattern.captures(line) {
            let number = caps.get(1).map(|m| m.as_str()).unwrap_or("1");
            let quantity = if *counted { number.parse().unwrap_or(1) } else { 1 };
            return Some(PackContentsItem::new(name.replace("$1", number), quantity));
        }
    }

    if let Some(caps) = COUNTED_ITEM.captures(line) {
        let quantity = caps[1].parse().unwrap_or(1);
        return Some(PackContentsItem::new(normalize_item_name(&caps[2]), quantity));
    }

    if let Some(caps) = ARTICLE_ITEM.captures(line) {
        return Some(PackContentsItem::new(normalize_item_name(&caps[1]), 1));
    }

    Some(PackContentsItem::new(normalize_item_name(line), 1))
}

/// Lowercase and singularize an item name ("Torches" -> "torch").
fn normalize_item_name(name: &str) -> String {
    let mut name = name.trim().to_lowercase();

    let depluralize = !PLURAL_EXCEPTIONS.iter().any(|e| name.contains(e));
    if depluralize && name.ends_with('s') && !name.ends_with("ss") {
        if name.ends_with("ches") || name.ends_with("shes") {
            name.truncate(name.len() - 2);
        } else {
            name.truncate(name.len() - 1);
        }
    }

    name
}

// ============================================================================
// Tests
// ============================================================================
