//! Record pieces shared by several entity parsers: flavor traits, `<roll>`
//! elements, and the document walk every parser performs.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ingestion::concerns::source_citations::{extract_citations, SourceCitation};
use crate::ingestion::xml::{parse_document, Element};

// ============================================================================
// Entity Parser Seam
// ============================================================================

/// A parser for one kind of compendium entity.
///
/// Implementors only describe how a single entity element becomes a record;
/// the document walk, logging, and skipping of unusable elements live here.
pub trait EntityParser {
    type Record;

    /// Element name of one entity (`class`, `spell`, ...).
    const ELEMENT: &'static str;

    /// Build a record from one entity element. `None` skips the element.
    fn parse_element(&self, element: &Element) -> Option<Self::Record>;

    /// Parse every entity element of a document, in document order.
    fn parse(&self, xml: &str) -> Result<Vec<Self::Record>> {
        let root = parse_document(xml)?;
        Ok(self.parse_root(&root))
    }

    /// Parse the entity elements below an already-read root.
    fn parse_root(&self, root: &Element) -> Vec<Self::Record> {
        let mut records = Vec::new();
        for element in root.children_named(Self::ELEMENT) {
            match self.parse_element(element) {
                Some(record) => records.push(record),
                None => tracing::warn!(
                    element = Self::ELEMENT,
                    "Skipping {} element without a name",
                    Self::ELEMENT
                ),
            }
        }
        tracing::debug!(element = Self::ELEMENT, count = records.len(), "Parsed entities");
        records
    }
}

// ============================================================================
// Text
// ============================================================================

/// All `<text>` children joined by newlines. Empty `<text/>` elements become
/// blank lines, which is how the compendium separates paragraphs.
pub fn element_text(element: &Element) -> String {
    element
        .children_named("text")
        .map(Element::text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// The entity name, or `None` when missing or blank.
pub fn entity_name(element: &Element) -> Option<String> {
    element.child_text("name").map(str::to_string)
}

/// Split a comma separated list, dropping blanks.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Rolls
// ============================================================================

/// `<roll description="Cold Damage" level="5">2d8</roll>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRecord {
    pub description: Option<String>,
    pub formula: String,
    pub level: Option<i32>,
}

pub fn parse_roll_elements(element: &Element) -> Vec<RollRecord> {
    element
        .children_named("roll")
        .filter(|roll| !roll.text().is_empty())
        .map(|roll| RollRecord {
            description: roll
                .attr("description")
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            formula: roll.text().to_string(),
            level: roll.attr("level").and_then(|l| l.trim().parse().ok()),
        })
        .collect()
}

// ============================================================================
// Traits
// ============================================================================

/// A named block of rules or flavor text (`<trait>`, `<action>`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitRecord {
    pub name: String,
    pub category: Option<String>,
    /// Text with the citation block removed
    pub description: String,
    pub sources: Vec<SourceCitation>,
    pub rolls: Vec<RollRecord>,
    pub sort_order: u32,
}

/// Parse every child element named `tag` as a trait, numbering them in order.
pub fn parse_trait_elements(element: &Element, tag: &str) -> Vec<TraitRecord> {
    element
        .children_named(tag)
        .enumerate()
        .map(|(index, trait_el)| {
            let extraction = extract_citations(&element_text(trait_el));
            TraitRecord {
                name: trait_el.child_text_or_empty("name").to_string(),
                category: trait_el
                    .attr("category")
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
                description: extraction.cleaned,
                sources: extraction.citations,
                rolls: parse_roll_elements(trait_el),
                sort_order: index as u32,
            }
        })
        .collect()
}

/// Citations of every trait, first occurrence of each book kept.
pub fn collect_sources(traits: &[TraitRecord]) -> Vec<SourceCitation> {
    let mut sources: Vec<SourceCitation> = Vec::new();
    for citation in traits.iter().flat_map(|t| t.sources.iter()) {
        if !sources.iter().any(|s| s.code == citation.code) {
            sources.push(citation.clone());
        }
    }
    sources
}
