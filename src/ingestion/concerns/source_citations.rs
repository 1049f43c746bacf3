//! Source Citation Extraction
//!
//! Compendium descriptions end with a citation block such as
//! `Source: Player's Handbook (2014) p. 127`, sometimes listing several
//! books separated by commas or line breaks. This module splits that block
//! off the description and turns each citation into a book code, an
//! optional edition year, and a page string.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::concerns::source_citations::extract_citations;
//!
//! let result = extract_citations("Darkvision.\n\nSource:\tPlayer's Handbook (2014) p. 127");
//! assert_eq!(result.cleaned, "Darkvision.");
//! assert_eq!(result.citations[0].code, "PHB");
//! assert_eq!(result.citations[0].pages, "127");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// One book reference from a citation block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    /// Book code ("PHB", "XGE")
    pub code: String,
    /// Edition year printed next to the title, if any
    pub year: Option<u16>,
    /// Page reference as written ("127", "12-14", "3, 5")
    pub pages: String,
}

/// Citations plus the description with the citation block removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationExtraction {
    pub citations: Vec<SourceCitation>,
    pub cleaned: String,
}

/// Known sourcebooks. Matching ignores case and apostrophe style.
const BOOK_CODES: &[(&str, &str)] = &[
    ("Player's Handbook", "PHB"),
    ("Dungeon Master's Guide", "DMG"),
    ("Monster Manual", "MM"),
    ("Xanathar's Guide to Everything", "XGE"),
    ("Tasha's Cauldron of Everything", "TCE"),
    ("Volo's Guide to Monsters", "VGM"),
    ("Mordenkainen's Tome of Foes", "MTF"),
    ("Mordenkainen Presents: Monsters of the Multiverse", "MPMM"),
    ("Sword Coast Adventurer's Guide", "SCAG"),
    ("Eberron: Rising from the Last War", "ERLW"),
    ("Wayfinder's Guide to Eberron", "WGTE"),
    ("Explorer's Guide to Wildemount", "EGW"),
    ("Guildmasters' Guide to Ravnica", "GGR"),
    ("Mythic Odysseys of Theros", "MOT"),
    ("Van Richten's Guide to Ravenloft", "VRGR"),
    ("Fizban's Treasury of Dragons", "FTD"),
    ("Strixhaven: A Curriculum of Chaos", "SCC"),
    ("Acquisitions Incorporated", "AI"),
    ("The Book of Many Things", "BMT"),
    ("Bigby Presents: Glory of the Giants", "BGG"),
    ("Astral Adventurer's Guide", "AAG"),
    ("Elemental Evil Player's Companion", "EEPC"),
    ("Lost Laboratory of Kwalish", "LLK"),
    ("Tomb of Annihilation", "TOA"),
    ("Curse of Strahd", "COS"),
];

// ============================================================================
// Regex Patterns
// ============================================================================

/// Start of the citation block: "Source:" at line start or after whitespace.
static SOURCE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\s)Source:").expect("Failed to compile source marker regex")
});

/// One citation: book title, optional "(year)", optional "p. pages".
static CITATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?P<book>[^,\n\t\s][^,\n\t]*?)
        \s*
        (?:\((?P<year>\d{4})\))?
        \s*
        (?:p(?:age)?s?\.?\s*(?P<pages>\d+(?:\s*[-–,]\s*\d+)*))?
        \s*(?:,|\n|\t|$)
        ",
    )
    .expect("Failed to compile citation regex")
});

// ============================================================================
// Extraction
// ============================================================================

/// Split a description into citations and cleaned text.
pub fn extract_citations(text: &str) -> CitationExtraction {
    let Some(marker) = SOURCE_MARKER.find(text) else {
        return CitationExtraction {
            citations: Vec::new(),
            cleaned: text.trim().to_string(),
        };
    };

    let block = &text[marker.end()..];
    let cleaned = text[..marker.start()].trim_end().trim().to_string();

    CitationExtraction {
        citations: parse_citation_block(block),
        cleaned,
    }
}

/// Citations only.
pub fn parse_citations(text: &str) -> Vec<SourceCitation> {
    extract_citations(text).citations
}

/// Description only, with any citation block removed.
pub fn strip_citations(text: &str) -> String {
    extract_citations(text).cleaned
}

fn parse_citation_block(block: &str) -> Vec<SourceCitation> {
    let mut citations = Vec::new();

    for caps in CITATION_PATTERN.captures_iter(block.trim()) {
        let book = caps.name("book").map(|m| m.as_str().trim()).unwrap_or("");
        if book.is_empty() || !book.chars().any(|c| c.is_alphabetic()) {
            continue;
        }

        let year = caps.name("year").and_then(|m| m.as_str().parse().ok());
        let pages = caps
            .name("pages")
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        citations.push(SourceCitation {
            code: book_code(book),
            year,
            pages,
        });
    }

    citations
}

/// Map a book title to its code, falling back to the initials of its capitalized words.
pub fn book_code(book: &str) -> String {
    let normalized = normalize_title(book);
    if let Some((_, code)) = BOOK_CODES
        .iter()
        .find(|(title, _)| normalize_title(title) == normalized)
    {
        return code.to_string();
    }

    let initials: String = book
        .split(|c: char| c.is_whitespace() || c == ':' || c == '-')
        .filter_map(|word| word.chars().next())
        .filter(|c| c.is_uppercase() || c.is_ascii_digit())
        .collect();

    if initials.is_empty() {
        book.to_uppercase()
    } else {
        initials
    }
}

fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(['’', '‘'], "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================
