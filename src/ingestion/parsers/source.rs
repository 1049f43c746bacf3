//! Sourcebook metadata from a `<source>` document (or `<source>` elements
//! inside a compendium).

use serde::{Deserialize, Serialize};

use super::common::{element_text, EntityParser};
use crate::ingestion::concerns::source_citations::book_code;
use crate::ingestion::xml::{leading_int, Element};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub name: String,
    /// Abbreviation ("PHB"); derived from the name when the element is missing
    pub code: String,
    pub publisher: Option<String>,
    pub publication_year: Option<u16>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub edition: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SourceParser;

impl SourceParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_source(&self, element: &Element) -> Option<SourceRecord> {
        let name = element.child_text("name")?.to_string();
        let optional = |tags: &[&str]| {
            tags.iter()
                .find_map(|tag| element.child_text(tag))
                .map(str::to_string)
        };

        let description = element_text(element);
        Some(SourceRecord {
            code: optional(&["abbreviation", "code"]).unwrap_or_else(|| book_code(&name)),
            publisher: optional(&["publisher"]),
            publication_year: optional(&["pub_date", "year", "publication_date"])
                .as_deref()
                .and_then(publication_year),
            url: optional(&["url"]),
            author: optional(&["author"]),
            edition: optional(&["edition"]),
            description: Some(description)
                .filter(|d| !d.is_empty())
                .or_else(|| optional(&["description"])),
            name,
        })
    }
}

/// "2014-08-19" or "2014" -> 2014
fn publication_year(text: &str) -> Option<u16> {
    leading_int(text)
        .and_then(|year| u16::try_from(year).ok())
        .filter(|year| (1970..=2100).contains(year))
}

impl EntityParser for SourceParser {
    type Record = SourceRecord;
    const ELEMENT: &'static str = "source";

    fn parse_element(&self, element: &Element) -> Option<SourceRecord> {
        self.parse_source(element)
    }

    /// A bare `<source>` document is itself the record.
    fn parse_root(&self, root: &Element) -> Vec<SourceRecord> {
        if root.name != Self::ELEMENT {
            return root
                .children_named(Self::ELEMENT)
                .filter_map(|el| self.parse_element(el))
                .collect();
        }
        match self.parse_element(root) {
            Some(record) => vec![record],
            None => {
                tracing::warn!("Skipping source document without a name");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_source_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<source>
  <name>Player's Handbook (2014)</name>
  <abbreviation>PHB</abbreviation>
  <publisher>Wizards of the Coast</publisher>
  <pub_date>2014-08-19</pub_date>
  <url>https://dnd.wizards.com/products/tabletop-games/rpg-products/rpg_playershandbook</url>
  <author>Jeremy Crawford</author>
  <edition>5e</edition>
  <text>The essential reference for every player.</text>
</source>"#;
        let sources = SourceParser::new().parse(xml).unwrap();
        assert_eq!(sources.len(), 1);
        let phb = &sources[0];
        assert_eq!(phb.code, "PHB");
        assert_eq!(phb.publication_year, Some(2014));
        assert_eq!(phb.publisher.as_deref(), Some("Wizards of the Coast"));
        assert_eq!(phb.edition.as_deref(), Some("5e"));
        assert_eq!(phb.description.as_deref(), Some("The essential reference for every player."));
    }

    #[test]
    fn test_sources_in_compendium() {
        let xml = r#"<compendium><source><name>Xanathar's Guide to Everything</name><year>2017</year></source><source><abbreviation>X</abbreviation></source></compendium>"#;
        let sources = SourceParser::new().parse(xml).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].code, "XGE");
        assert_eq!(sources[0].publication_year, Some(2017));
        assert_eq!(sources[0].description, None);
    }
}
